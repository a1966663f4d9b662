// Client: outbound dispatch pipeline over a protocol gateway
// One send() call runs a full dispatch cycle: batch the receivers, hash
// file attachments once, simulate typing for direct sends, route each
// message to the matching gateway operation, drain gateway events, and
// assemble a delivery receipt per (receiver, message) pair.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::Mutex as TokioMutex;

pub mod batching;
pub mod composing;
pub mod connection;
pub mod contacts;

pub use batching::DispatchTarget;
pub use connection::ConnectionState;

use crate::attachment;
use crate::config::{Account, Config};
use crate::error::{Capability, ClientError, GatewayError};
use crate::gateway::{EventListener, Gateway, SessionStore};
use crate::models::{
    DeliveryReceipt, DispatchFailure, DispatchReport, InboundMessage, Message,
};
use crate::outbox::Outbox;

type SharedGateway = Arc<TokioMutex<Box<dyn Gateway>>>;

/// Stateful client owning the single gateway connection.
///
/// Constructed with explicit collaborators via [`Client::new`]; connection
/// state is owned here exclusively and mutated only by the lifecycle
/// methods in `connection.rs`.
pub struct Client {
    gateway: SharedGateway,
    session: Box<dyn SessionStore>,
    config: Config,
    account: Account,
    state: ConnectionState,
    /// True only for the duration of one bulk dispatch cycle.
    bulk: bool,
    outbox: Outbox,
}

impl Client {
    /// Build a client from explicit collaborators.
    ///
    /// Fails fast, before any connection attempt, when the gateway is
    /// missing a required capability or the configured default account does
    /// not exist.
    pub fn new(
        mut gateway: Box<dyn Gateway>,
        session: Box<dyn SessionStore>,
        listener: Arc<dyn EventListener>,
        config: Config,
    ) -> Result<Self, ClientError> {
        for capability in Capability::REQUIRED {
            if !gateway.supports(capability) {
                return Err(ClientError::MissingCapability(capability));
            }
        }
        let account = config.account()?.clone();
        gateway.register_listener(listener);

        Ok(Client {
            gateway: Arc::new(TokioMutex::new(gateway)),
            session,
            config,
            account,
            state: ConnectionState::Disconnected,
            bulk: false,
            outbox: Outbox::new(),
        })
    }

    /// The account this client runs as.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Whether a bulk dispatch cycle is in flight. True only inside a
    /// cycle whose receiver set crossed the direct-send limit; always
    /// false between cycles.
    pub fn bulk_mode(&self) -> bool {
        self.bulk
    }

    /// Queue `message`, let `stage` add receivers, further messages and
    /// receipt metadata, then run one dispatch cycle.
    ///
    /// Connects lazily if needed. The outbox and the bulk-mode flag are
    /// reset unconditionally when the cycle ends, whether it completed or
    /// aborted.
    pub async fn send<F>(&mut self, message: Message, stage: F) -> Result<DispatchReport, ClientError>
    where
        F: FnOnce(&mut Outbox),
    {
        self.outbox.queue(message);
        stage(&mut self.outbox);

        let result = self.run_dispatch().await;
        self.bulk = false;
        self.outbox.clear();
        result
    }

    async fn run_dispatch(&mut self) -> Result<DispatchReport, ClientError> {
        self.connect_and_login().await?;

        let (targets, bulk) = batching::plan(self.outbox.receivers(), self.config.broadcast_limit);
        self.bulk = bulk;
        debug!(
            "dispatch cycle: {} messages to {} targets (bulk: {})",
            self.outbox.len(),
            targets.len(),
            bulk
        );

        let mut report = DispatchReport::default();
        'targets: for target in &targets {
            for index in 0..self.outbox.len() {
                if let Err(error) = attachment::ensure_hash(self.outbox.message_mut(index)).await {
                    warn!("skipping undeliverable attachment: {}", error);
                    report.failures.push(DispatchFailure {
                        to: target.descriptor(),
                        kind: self.outbox.messages()[index].kind(),
                        error,
                    });
                    continue;
                }
                let message = self.outbox.messages()[index].clone();

                if let DispatchTarget::Single(to) = target {
                    let delay = self.outbox.composition_delay(&message);
                    self.compose(to, delay).await;
                }

                let outcome = self.dispatch_one(target, &message).await;
                // Inbound traffic queues up behind every send; drain it
                // whether or not the send went through.
                self.drain_events().await;

                match outcome {
                    Ok(id) => report.receipts.push(self.build_receipt(Some(id), target, message)),
                    Err(error) => {
                        let fatal = error.is_fatal();
                        report.failures.push(DispatchFailure {
                            to: target.descriptor(),
                            kind: message.kind(),
                            error: error.into(),
                        });
                        if fatal {
                            warn!("aborting dispatch cycle after fatal gateway error");
                            break 'targets;
                        }
                    }
                }
            }
        }

        info!(
            "dispatch cycle finished: {} receipts, {} failures",
            report.receipts.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Route one message to the gateway operation matching its variant and
    /// the delivery mode. The match is exhaustive over the message enum, so
    /// an unhandled variant is a compile error, not a silent skip.
    async fn dispatch_one(
        &mut self,
        target: &DispatchTarget,
        message: &Message,
    ) -> Result<String, GatewayError> {
        use DispatchTarget::{Bulk, Single};

        let mut gateway = self.gateway.lock().await;
        match (message, target) {
            (Message::Text { body }, Single(to)) => gateway.send_text(to, body).await,
            (Message::Text { body }, Bulk(to)) => gateway.send_broadcast_text(to, body).await,

            (Message::Image { media, caption }, Single(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_image(to, &media.path, false, media.size, hash, caption.as_deref())
                    .await
            }
            (Message::Image { media, caption }, Bulk(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_broadcast_image(to, &media.path, false, media.size, hash, caption.as_deref())
                    .await
            }

            (Message::Audio { media }, Single(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_audio(to, &media.path, false, media.size, hash)
                    .await
            }
            (Message::Audio { media }, Bulk(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_broadcast_audio(to, &media.path, false, media.size, hash)
                    .await
            }

            (Message::Video { media, caption }, Single(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_video(to, &media.path, false, media.size, hash, caption.as_deref())
                    .await
            }
            (Message::Video { media, caption }, Bulk(to)) => {
                let hash = media.hash.as_deref().unwrap_or_default();
                gateway
                    .send_broadcast_video(to, &media.path, false, media.size, hash, caption.as_deref())
                    .await
            }

            (
                Message::Location {
                    longitude,
                    latitude,
                    caption,
                    url,
                },
                Single(to),
            ) => {
                gateway
                    .send_location(to, *longitude, *latitude, caption.as_deref(), url.as_deref())
                    .await
            }
            (
                Message::Location {
                    longitude,
                    latitude,
                    caption,
                    url,
                },
                Bulk(to),
            ) => {
                gateway
                    .send_broadcast_location(to, *longitude, *latitude, caption.as_deref(), url.as_deref())
                    .await
            }

            (Message::ContactCard { name, vcard }, Single(to)) => {
                gateway.send_vcard(to, name, vcard).await
            }
            (Message::ContactCard { name, vcard }, Bulk(to)) => {
                gateway.send_broadcast_vcard(to, name, vcard).await
            }
        }
    }

    fn build_receipt(
        &self,
        id: Option<String>,
        target: &DispatchTarget,
        message: Message,
    ) -> DeliveryReceipt {
        DeliveryReceipt {
            id,
            kind: message.kind(),
            sender: self.account.number.clone(),
            nickname: self.account.nickname.clone(),
            to: target.descriptor(),
            message,
            metadata: self.outbox.metadata().clone(),
            timestamp: Utc::now().timestamp() as u64,
        }
    }

    /// Consume pending gateway events, stopping at the configured poll cap
    /// so a chatty or wedged gateway cannot livelock the cycle.
    pub(crate) async fn drain_events(&mut self) {
        let mut gateway = self.gateway.lock().await;
        for _ in 0..self.config.max_drain_polls {
            match gateway.poll_event().await {
                Ok(true) => continue,
                Ok(false) => return,
                Err(e) => {
                    warn!("event drain stopped early: {}", e);
                    return;
                }
            }
        }
        warn!(
            "event drain incomplete after {} polls",
            self.config.max_drain_polls
        );
    }

    /// Drain pending events, then fetch whatever inbound messages the
    /// gateway has accumulated.
    pub async fn get_new_messages(&mut self) -> Result<Vec<InboundMessage>, ClientError> {
        self.connect_and_login().await?;
        self.drain_events().await;
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.received_messages().await?)
    }
}
