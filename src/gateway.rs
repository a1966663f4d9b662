// External collaborator contracts
// The protocol gateway, the session store and the event sink are consumed
// through these traits so implementations stay swappable (and mockable).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Capability, GatewayError};
use crate::models::InboundMessage;

/// An asynchronous protocol event surfaced by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

/// Sink for protocol-level events. Registered against the gateway at client
/// construction; what it does with the events is its own business.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &GatewayEvent);
}

/// The lower-level protocol gateway the dispatch pipeline drives.
///
/// Every send operation comes in a single-target and a broadcast variant;
/// both return the gateway-assigned message id. All calls are sequential
/// and blocking from the pipeline's point of view.
#[async_trait]
pub trait Gateway: Send {
    fn supports(&self, capability: Capability) -> bool;
    fn register_listener(&mut self, listener: Arc<dyn EventListener>);

    // Connection and session setup
    async fn connect(&mut self) -> Result<(), GatewayError>;
    async fn login(&mut self, number: &str, password: &str) -> Result<(), GatewayError>;
    async fn get_client_config(&mut self) -> Result<(), GatewayError>;
    async fn get_server_properties(&mut self) -> Result<(), GatewayError>;
    async fn get_groups(&mut self) -> Result<(), GatewayError>;
    async fn get_broadcast_lists(&mut self) -> Result<(), GatewayError>;
    async fn get_privacy_blocked_list(&mut self) -> Result<(), GatewayError>;
    async fn disconnect(&mut self) -> Result<(), GatewayError>;

    // Presence
    async fn send_available_for_chat(&mut self, nickname: &str) -> Result<(), GatewayError>;
    async fn send_active_status(&mut self) -> Result<(), GatewayError>;
    async fn send_offline_status(&mut self) -> Result<(), GatewayError>;
    async fn send_composing(&mut self, to: &str) -> Result<(), GatewayError>;
    async fn send_paused(&mut self, to: &str) -> Result<(), GatewayError>;
    async fn send_presence_subscription(&mut self, to: &str) -> Result<(), GatewayError>;
    async fn send_presence_unsubscription(&mut self, to: &str) -> Result<(), GatewayError>;

    // Message delivery
    async fn send_text(&mut self, to: &str, body: &str) -> Result<String, GatewayError>;
    async fn send_broadcast_text(
        &mut self,
        to: &[String],
        body: &str,
    ) -> Result<String, GatewayError>;

    #[allow(clippy::too_many_arguments)]
    async fn send_image(
        &mut self,
        to: &str,
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
        caption: Option<&str>,
    ) -> Result<String, GatewayError>;
    #[allow(clippy::too_many_arguments)]
    async fn send_broadcast_image(
        &mut self,
        to: &[String],
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
        caption: Option<&str>,
    ) -> Result<String, GatewayError>;

    async fn send_audio(
        &mut self,
        to: &str,
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
    ) -> Result<String, GatewayError>;
    async fn send_broadcast_audio(
        &mut self,
        to: &[String],
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
    ) -> Result<String, GatewayError>;

    #[allow(clippy::too_many_arguments)]
    async fn send_video(
        &mut self,
        to: &str,
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
        caption: Option<&str>,
    ) -> Result<String, GatewayError>;
    #[allow(clippy::too_many_arguments)]
    async fn send_broadcast_video(
        &mut self,
        to: &[String],
        path: &Path,
        forwarded: bool,
        size: u64,
        hash: &str,
        caption: Option<&str>,
    ) -> Result<String, GatewayError>;

    async fn send_location(
        &mut self,
        to: &str,
        longitude: f64,
        latitude: f64,
        caption: Option<&str>,
        url: Option<&str>,
    ) -> Result<String, GatewayError>;
    async fn send_broadcast_location(
        &mut self,
        to: &[String],
        longitude: f64,
        latitude: f64,
        caption: Option<&str>,
        url: Option<&str>,
    ) -> Result<String, GatewayError>;

    async fn send_vcard(
        &mut self,
        to: &str,
        name: &str,
        vcard: &str,
    ) -> Result<String, GatewayError>;
    async fn send_broadcast_vcard(
        &mut self,
        to: &[String],
        name: &str,
        vcard: &str,
    ) -> Result<String, GatewayError>;

    // Inbound traffic
    /// Consume one pending inbound event. Returns `true` while more remain.
    async fn poll_event(&mut self) -> Result<bool, GatewayError>;
    async fn received_messages(&mut self) -> Result<Vec<InboundMessage>, GatewayError>;

    // Contact sync
    async fn send_contact_sync(
        &mut self,
        add: &[String],
        delete: &[String],
    ) -> Result<(), GatewayError>;
}

/// Result of a session-store pull after a contact sync.
#[derive(Debug, Clone, Default)]
pub struct SyncPull {
    /// Addresses the server confirmed as existing, keyed by the address the
    /// caller submitted (formatting included), with server-side details as
    /// the value.
    pub existing: BTreeMap<String, serde_json::Value>,
}

/// Persistent session/contact storage, written to by the gateway's event
/// handling and read back here.
#[async_trait]
pub trait SessionStore: Send {
    async fn pull(&mut self) -> Result<Option<SyncPull>, GatewayError>;
}
