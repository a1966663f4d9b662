// courier: outbound message dispatch pipeline for chat protocol gateways
// The client sits between a caller staging heterogeneous messages and a
// lower-level gateway that actually transmits them.

pub mod attachment;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod outbox;

// Re-export the main types for convenience
pub use client::{Client, ConnectionState, DispatchTarget};
pub use config::{Account, Config};
pub use error::{Capability, ClientError, GatewayError};
pub use gateway::{EventListener, Gateway, GatewayEvent, SessionStore, SyncPull};
pub use models::{
    DeliveryReceipt, DispatchFailure, DispatchReport, InboundMessage, MediaPayload, Message,
    MessageKind,
};
pub use outbox::Outbox;
