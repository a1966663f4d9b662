// Connection lifecycle for the client
// Idempotent connect/initialize and disconnect, plus the drop guard that
// tears the connection down on every exit path.

use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use tokio::time::sleep;

use super::{Client, SharedGateway};
use crate::error::ClientError;

/// The two states the single gateway connection can be in. Owned and
/// mutated exclusively by the lifecycle methods below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl Client {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect, log in and run the fixed initialization sequence.
    ///
    /// No-op when already connected, so every entry point can call this
    /// lazily. The state flips to `Connected` only after the whole sequence
    /// succeeded.
    pub async fn connect_and_login(&mut self) -> Result<(), ClientError> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        info!("connecting to gateway as {}", self.account.number);
        {
            let mut gateway = self.gateway.lock().await;
            gateway.connect().await?;
            gateway
                .login(&self.account.number, &self.account.password)
                .await?;
            gateway.get_client_config().await?;
            gateway.get_server_properties().await?;
            gateway.get_groups().await?;
            gateway.get_broadcast_lists().await?;
            gateway.get_privacy_blocked_list().await?;
            gateway
                .send_available_for_chat(&self.account.nickname)
                .await?;
        }
        self.state = ConnectionState::Connected;
        info!("gateway session initialized");
        Ok(())
    }

    /// Announce offline presence and tear the transport down.
    ///
    /// No-op when already disconnected. Waits a short randomized delay first
    /// so sessions don't close at machine-like speed; the bounds come from
    /// the configuration and may be zero. The state is `Disconnected`
    /// afterwards no matter how the teardown went.
    pub async fn logout_and_disconnect(&mut self) -> Result<(), ClientError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        let (lo, hi) = self.config.disconnect_jitter_ms;
        sleep(jitter(lo, hi)).await;

        let result = {
            let mut gateway = self.gateway.lock().await;
            if let Err(e) = gateway.send_offline_status().await {
                warn!("failed to announce offline presence: {}", e);
            }
            gateway.disconnect().await
        };
        self.state = ConnectionState::Disconnected;
        info!("disconnected from gateway");
        result.map_err(ClientError::from)
    }
}

fn jitter(lo: u64, hi: u64) -> Duration {
    let hi = hi.max(lo);
    if hi == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}

async fn teardown(gateway: SharedGateway, jitter_ms: (u64, u64)) {
    let (lo, hi) = jitter_ms;
    sleep(jitter(lo, hi)).await;

    let mut gateway = gateway.lock().await;
    if let Err(e) = gateway.send_offline_status().await {
        warn!("failed to announce offline presence: {}", e);
    }
    if let Err(e) = gateway.disconnect().await {
        warn!("failed to close gateway connection: {}", e);
    }
    debug!("drop teardown finished");
}

/// Guaranteed teardown: a client dropped while connected still logs out.
/// Drop cannot await, so the teardown is detached onto the current runtime;
/// outside a runtime there is nothing to run it on and the skip is logged.
impl Drop for Client {
    fn drop(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(teardown(
                    self.gateway.clone(),
                    self.config.disconnect_jitter_ms,
                ));
            }
            Err(_) => {
                warn!("client dropped while connected outside a runtime; skipping gateway teardown");
            }
        }
    }
}
