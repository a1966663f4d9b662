// Shared test utilities: a recording mock gateway, a scripted session store
// and client construction helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use courier::{
    Account, Capability, Client, Config, EventListener, Gateway, GatewayError, GatewayEvent,
    InboundMessage, SessionStore, SyncPull,
};

/// Every observable interaction with the mock gateway, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect,
    Login(String),
    GetClientConfig,
    GetServerProperties,
    GetGroups,
    GetBroadcastLists,
    GetPrivacyBlockedList,
    AvailableForChat(String),
    ActiveStatus,
    OfflineStatus,
    Composing(String),
    Paused(String),
    Subscribe(String),
    Unsubscribe(String),
    Text { to: String, body: String },
    BroadcastText { to: Vec<String>, body: String },
    Image { to: String, size: u64, hash: String, caption: Option<String> },
    BroadcastImage { to: Vec<String>, hash: String },
    Audio { to: String, hash: String },
    BroadcastAudio { to: Vec<String>, hash: String },
    Video { to: String, hash: String },
    BroadcastVideo { to: Vec<String>, hash: String },
    Location { to: String, longitude: f64, latitude: f64 },
    BroadcastLocation { to: Vec<String>, longitude: f64, latitude: f64 },
    Vcard { to: String, name: String },
    BroadcastVcard { to: Vec<String>, name: String },
    PollEvent,
    ReceivedMessages,
    ContactSync { add: Vec<String>, delete: Vec<String> },
    Disconnect,
}

/// How text sends should fail, when a test scripts a failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailMode {
    Protocol,
    Transport,
}

pub struct MockGateway {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub capabilities: Vec<Capability>,
    /// Events still queued; each poll consumes one. `u64::MAX` never runs
    /// out, which is how the drain-bounding test wedges the gateway.
    pub pending_events: Arc<Mutex<u64>>,
    pub fail_texts: Option<FailMode>,
    pub inbound: Vec<InboundMessage>,
    listener: Option<Arc<dyn EventListener>>,
}

impl MockGateway {
    pub fn new() -> Self {
        MockGateway {
            calls: Arc::new(Mutex::new(Vec::new())),
            capabilities: Capability::REQUIRED.to_vec(),
            pending_events: Arc::new(Mutex::new(0)),
            fail_texts: None,
            inbound: Vec::new(),
            listener: None,
        }
    }

    pub fn without_capability(mut self, capability: Capability) -> Self {
        self.capabilities.retain(|c| *c != capability);
        self
    }

    pub fn with_pending_events(self, count: u64) -> Self {
        *self.pending_events.lock().unwrap() = count;
        self
    }

    pub fn failing_texts(mut self, mode: FailMode) -> Self {
        self.fail_texts = Some(mode);
        self
    }

    pub fn with_inbound(mut self, inbound: Vec<InboundMessage>) -> Self {
        self.inbound = inbound;
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn register_listener(&mut self, listener: Arc<dyn EventListener>) {
        self.listener = Some(listener);
    }

    async fn connect(&mut self) -> Result<(), GatewayError> {
        self.record(Call::Connect);
        Ok(())
    }

    async fn login(&mut self, number: &str, _password: &str) -> Result<(), GatewayError> {
        self.record(Call::Login(number.to_string()));
        Ok(())
    }

    async fn get_client_config(&mut self) -> Result<(), GatewayError> {
        self.record(Call::GetClientConfig);
        Ok(())
    }

    async fn get_server_properties(&mut self) -> Result<(), GatewayError> {
        self.record(Call::GetServerProperties);
        Ok(())
    }

    async fn get_groups(&mut self) -> Result<(), GatewayError> {
        self.record(Call::GetGroups);
        Ok(())
    }

    async fn get_broadcast_lists(&mut self) -> Result<(), GatewayError> {
        self.record(Call::GetBroadcastLists);
        Ok(())
    }

    async fn get_privacy_blocked_list(&mut self) -> Result<(), GatewayError> {
        self.record(Call::GetPrivacyBlockedList);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), GatewayError> {
        self.record(Call::Disconnect);
        Ok(())
    }

    async fn send_available_for_chat(&mut self, nickname: &str) -> Result<(), GatewayError> {
        self.record(Call::AvailableForChat(nickname.to_string()));
        Ok(())
    }

    async fn send_active_status(&mut self) -> Result<(), GatewayError> {
        self.record(Call::ActiveStatus);
        Ok(())
    }

    async fn send_offline_status(&mut self) -> Result<(), GatewayError> {
        self.record(Call::OfflineStatus);
        Ok(())
    }

    async fn send_composing(&mut self, to: &str) -> Result<(), GatewayError> {
        self.record(Call::Composing(to.to_string()));
        Ok(())
    }

    async fn send_paused(&mut self, to: &str) -> Result<(), GatewayError> {
        self.record(Call::Paused(to.to_string()));
        Ok(())
    }

    async fn send_presence_subscription(&mut self, to: &str) -> Result<(), GatewayError> {
        self.record(Call::Subscribe(to.to_string()));
        Ok(())
    }

    async fn send_presence_unsubscription(&mut self, to: &str) -> Result<(), GatewayError> {
        self.record(Call::Unsubscribe(to.to_string()));
        Ok(())
    }

    async fn send_text(&mut self, to: &str, body: &str) -> Result<String, GatewayError> {
        self.record(Call::Text {
            to: to.to_string(),
            body: body.to_string(),
        });
        match self.fail_texts {
            Some(FailMode::Protocol) => Err(GatewayError::Protocol("server said no".into())),
            Some(FailMode::Transport) => Err(GatewayError::Transport("socket closed".into())),
            None => Ok(self.next_id()),
        }
    }

    async fn send_broadcast_text(
        &mut self,
        to: &[String],
        body: &str,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastText {
            to: to.to_vec(),
            body: body.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_image(
        &mut self,
        to: &str,
        _path: &Path,
        _forwarded: bool,
        size: u64,
        hash: &str,
        caption: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::Image {
            to: to.to_string(),
            size,
            hash: hash.to_string(),
            caption: caption.map(str::to_string),
        });
        Ok(self.next_id())
    }

    async fn send_broadcast_image(
        &mut self,
        to: &[String],
        _path: &Path,
        _forwarded: bool,
        _size: u64,
        hash: &str,
        _caption: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastImage {
            to: to.to_vec(),
            hash: hash.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_audio(
        &mut self,
        to: &str,
        _path: &Path,
        _forwarded: bool,
        _size: u64,
        hash: &str,
    ) -> Result<String, GatewayError> {
        self.record(Call::Audio {
            to: to.to_string(),
            hash: hash.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_broadcast_audio(
        &mut self,
        to: &[String],
        _path: &Path,
        _forwarded: bool,
        _size: u64,
        hash: &str,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastAudio {
            to: to.to_vec(),
            hash: hash.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_video(
        &mut self,
        to: &str,
        _path: &Path,
        _forwarded: bool,
        _size: u64,
        hash: &str,
        _caption: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::Video {
            to: to.to_string(),
            hash: hash.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_broadcast_video(
        &mut self,
        to: &[String],
        _path: &Path,
        _forwarded: bool,
        _size: u64,
        hash: &str,
        _caption: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastVideo {
            to: to.to_vec(),
            hash: hash.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_location(
        &mut self,
        to: &str,
        longitude: f64,
        latitude: f64,
        _caption: Option<&str>,
        _url: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::Location {
            to: to.to_string(),
            longitude,
            latitude,
        });
        Ok(self.next_id())
    }

    async fn send_broadcast_location(
        &mut self,
        to: &[String],
        longitude: f64,
        latitude: f64,
        _caption: Option<&str>,
        _url: Option<&str>,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastLocation {
            to: to.to_vec(),
            longitude,
            latitude,
        });
        Ok(self.next_id())
    }

    async fn send_vcard(
        &mut self,
        to: &str,
        name: &str,
        _vcard: &str,
    ) -> Result<String, GatewayError> {
        self.record(Call::Vcard {
            to: to.to_string(),
            name: name.to_string(),
        });
        Ok(self.next_id())
    }

    async fn send_broadcast_vcard(
        &mut self,
        to: &[String],
        name: &str,
        _vcard: &str,
    ) -> Result<String, GatewayError> {
        self.record(Call::BroadcastVcard {
            to: to.to_vec(),
            name: name.to_string(),
        });
        Ok(self.next_id())
    }

    async fn poll_event(&mut self) -> Result<bool, GatewayError> {
        self.record(Call::PollEvent);
        let mut pending = self.pending_events.lock().unwrap();
        if *pending == 0 {
            return Ok(false);
        }
        if *pending != u64::MAX {
            *pending -= 1;
        }
        if let Some(listener) = &self.listener {
            listener.on_event(&GatewayEvent {
                name: "inbound".to_string(),
                payload: serde_json::Value::Null,
            });
        }
        Ok(true)
    }

    async fn received_messages(&mut self) -> Result<Vec<InboundMessage>, GatewayError> {
        self.record(Call::ReceivedMessages);
        Ok(self.inbound.clone())
    }

    async fn send_contact_sync(
        &mut self,
        add: &[String],
        delete: &[String],
    ) -> Result<(), GatewayError> {
        self.record(Call::ContactSync {
            add: add.to_vec(),
            delete: delete.to_vec(),
        });
        Ok(())
    }
}

/// Session store returning a pre-scripted pull result.
pub struct MockSession {
    pub pull_result: Option<SyncPull>,
}

impl MockSession {
    pub fn empty() -> Self {
        MockSession { pull_result: None }
    }
}

#[async_trait]
impl SessionStore for MockSession {
    async fn pull(&mut self) -> Result<Option<SyncPull>, GatewayError> {
        Ok(self.pull_result.clone())
    }
}

/// Listener that just counts what it sees.
pub struct CountingListener {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl CountingListener {
    pub fn new() -> Self {
        CountingListener {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EventListener for CountingListener {
    fn on_event(&self, event: &GatewayEvent) {
        self.events.lock().unwrap().push(event.name.clone());
    }
}

pub fn setup_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Config with test-friendly settings: zero disconnect jitter, a small
/// drain cap, default broadcast limit.
pub fn test_config() -> Config {
    let mut accounts = HashMap::new();
    accounts.insert(
        "primary".to_string(),
        Account {
            number: "15550001111".into(),
            nickname: "Courier".into(),
            password: "secret".into(),
        },
    );
    Config {
        default_account: "primary".into(),
        accounts,
        broadcast_limit: 10,
        media_path: std::env::temp_dir(),
        challenge_path: std::env::temp_dir(),
        debug: false,
        log: false,
        disconnect_jitter_ms: (0, 0),
        max_drain_polls: 8,
    }
}

/// Build a client around the given mock gateway, returning the shared call
/// log for assertions.
pub fn new_client(gateway: MockGateway) -> (Client, Arc<Mutex<Vec<Call>>>) {
    new_client_with(gateway, MockSession::empty(), test_config())
}

pub fn new_client_with(
    gateway: MockGateway,
    session: MockSession,
    config: Config,
) -> (Client, Arc<Mutex<Vec<Call>>>) {
    setup_logging();
    let calls = gateway.calls.clone();
    let client = Client::new(
        Box::new(gateway),
        Box::new(session),
        Arc::new(CountingListener::new()),
        config,
    )
    .expect("client construction should succeed");
    (client, calls)
}

/// The calls the fixed connect/initialize sequence must issue, in order.
pub fn init_sequence(number: &str, nickname: &str) -> Vec<Call> {
    vec![
        Call::Connect,
        Call::Login(number.to_string()),
        Call::GetClientConfig,
        Call::GetServerProperties,
        Call::GetGroups,
        Call::GetBroadcastLists,
        Call::GetPrivacyBlockedList,
        Call::AvailableForChat(nickname.to_string()),
    ]
}
