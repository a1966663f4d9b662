// Client configuration
// Mirrors the options a deployment provides: account credentials, bulk
// sending limits, storage paths and debug switches.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Credentials and identity for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub number: String,
    pub nickname: String,
    pub password: String,
}

/// Immutable configuration for the lifetime of a client instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key into `accounts` selecting the account this client runs as.
    pub default_account: String,
    pub accounts: HashMap<String, Account>,

    /// Receiver sets larger than the direct-send cutover are chunked into
    /// bulk sends of at most this many addresses.
    #[serde(default = "default_broadcast_limit")]
    pub broadcast_limit: usize,

    /// Where downloaded/staged media lives.
    #[serde(default)]
    pub media_path: PathBuf,

    /// Directory holding per-number login challenge files.
    #[serde(default)]
    pub challenge_path: PathBuf,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub log: bool,

    /// Bounds (ms) of the randomized delay before disconnecting. `(0, 0)`
    /// disables the delay entirely, which tests rely on.
    #[serde(default = "default_disconnect_jitter")]
    pub disconnect_jitter_ms: (u64, u64),

    /// Hard cap on event-drain polls after each send. The drain stops at the
    /// cap with a warning instead of spinning forever.
    #[serde(default = "default_max_drain_polls")]
    pub max_drain_polls: u32,
}

fn default_broadcast_limit() -> usize {
    10
}

fn default_disconnect_jitter() -> (u64, u64) {
    (1_000, 2_000)
}

fn default_max_drain_polls() -> u32 {
    64
}

impl Config {
    /// The account selected by `default_account`.
    pub fn account(&self) -> Result<&Account, ClientError> {
        self.accounts
            .get(&self.default_account)
            .ok_or_else(|| ClientError::UnknownAccount(self.default_account.clone()))
    }
}
