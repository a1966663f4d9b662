// Contact sync and presence operations
// Pushes add/delete syncs to the gateway, pulls the confirmed contacts from
// the session store and subscribes to their presence.

use log::{debug, info};

use super::Client;
use crate::error::ClientError;
use crate::gateway::SyncPull;

/// Strip formatting artifacts from a phone-style address so it matches the
/// gateway's canonical form.
pub fn normalize_address(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '+' | '-' | ' ' | '(' | ')'))
        .collect()
}

impl Client {
    /// Sync `add`/`delete` with the server, then subscribe to the presence
    /// of every contact the server confirmed as existing. Returns the raw
    /// session-store pull so the caller can inspect the full result.
    pub async fn sync_contacts(
        &mut self,
        add: &[String],
        delete: &[String],
    ) -> Result<Option<SyncPull>, ClientError> {
        self.connect_and_login().await?;
        {
            let mut gateway = self.gateway.lock().await;
            gateway.send_contact_sync(add, delete).await?;
        }

        let result = self.session.pull().await?;
        if let Some(pull) = &result {
            if !pull.existing.is_empty() {
                let confirmed: Vec<String> =
                    pull.existing.keys().map(|k| normalize_address(k)).collect();
                info!("contact sync confirmed {} existing contacts", confirmed.len());
                self.subscribe(&confirmed).await?;
            } else {
                debug!("contact sync confirmed no existing contacts");
            }
        }
        Ok(result)
    }

    /// Subscribe to presence updates for each address; updates keep coming
    /// in as long as the connection is open.
    pub async fn subscribe(&mut self, to: &[String]) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        for address in to {
            gateway.send_presence_subscription(address).await?;
        }
        Ok(())
    }

    /// Stop presence updates for each address.
    pub async fn unsubscribe(&mut self, to: &[String]) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        for address in to {
            gateway.send_presence_unsubscription(address).await?;
        }
        Ok(())
    }

    /// Show up as "online".
    pub async fn online(&mut self) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.send_active_status().await?)
    }

    /// Announce availability for chat, with the account nickname unless a
    /// different one is given.
    pub async fn available(&mut self, nickname: Option<&str>) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let nickname = nickname.unwrap_or(&self.account.nickname).to_string();
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.send_available_for_chat(&nickname).await?)
    }

    /// Show up as "offline" without dropping the connection.
    pub async fn offline(&mut self) -> Result<(), ClientError> {
        self.connect_and_login().await?;
        let mut gateway = self.gateway.lock().await;
        Ok(gateway.send_offline_status().await?)
    }
}
