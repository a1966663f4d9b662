// Typed errors for the client surface and the gateway contract

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Native capabilities a gateway implementation must provide before a client
/// will drive it. Checked once, at construction, so a misconfigured gateway
/// fails before any connection attempt is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Payload encryption support.
    Encryption,
    /// curve25519 key agreement, required by the login handshake.
    Curve25519,
    /// Protobuf framing for media and presence traffic.
    Protobuf,
}

impl Capability {
    /// Every capability a client refuses to run without.
    pub const REQUIRED: [Capability; 3] = [
        Capability::Encryption,
        Capability::Curve25519,
        Capability::Protobuf,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Encryption => "encryption",
            Capability::Curve25519 => "curve25519",
            Capability::Protobuf => "protobuf",
        };
        write!(f, "{}", name)
    }
}

/// Errors surfaced by gateway implementations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The underlying transport failed. Fatal for the current dispatch
    /// cycle: remaining sends would only fail the same way.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server rejected one operation. Not fatal; later sends may still
    /// go through.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("gateway is not connected")]
    NotConnected,
}

impl GatewayError {
    /// Whether this error should abort the remainder of a dispatch cycle.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GatewayError::Protocol(_))
    }
}

/// Errors surfaced by [`crate::Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("missing gateway capability: {0}")]
    MissingCapability(Capability),

    #[error("no account configured under \"{0}\"")]
    UnknownAccount(String),

    #[error("failed to read attachment {path}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
