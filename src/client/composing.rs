// Composition simulation
// Direct sends are framed by composing/paused presence signals with a
// typing-speed delay in between; bulk sends skip this entirely.

use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use super::Client;
use crate::error::ClientError;

impl Client {
    /// Announce "composing" to the target, wait out the typing delay, then
    /// announce "paused". Presence failures are logged and swallowed; they
    /// must not cost the message itself.
    pub(crate) async fn compose(&mut self, to: &str, delay: Duration) {
        {
            let mut gateway = self.gateway.lock().await;
            if let Err(e) = gateway.send_composing(to).await {
                warn!("failed to send composing state to {}: {}", to, e);
            }
        }
        debug!("composing to {} for {:?}", to, delay);
        sleep(delay).await;
        let mut gateway = self.gateway.lock().await;
        if let Err(e) = gateway.send_paused(to).await {
            warn!("failed to send paused state to {}: {}", to, e);
        }
    }

    /// Show the chat state "typing…" to `to`.
    pub async fn typing(&mut self, to: &str) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.send_composing(to).await?)
    }

    /// Clear the typing indicator towards `to`.
    pub async fn paused(&mut self, to: &str) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.send_paused(to).await?)
    }
}
