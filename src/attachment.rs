// Attachment content hashing
// SHA-256 over the file bytes, base64-encoded, computed at most once per
// message and stored back on its media payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use sha2::{Digest, Sha256};

use crate::error::ClientError;
use crate::models::Message;

/// base64-encoded SHA-256 of `bytes`, the encoding every gateway send and
/// receipt carries for file-backed messages.
pub fn content_hash(bytes: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(bytes))
}

/// Fill in the content hash of a file-backed message if it is still unset.
///
/// Idempotent: a message whose hash is already populated is left untouched,
/// so re-dispatching it never rereads or rehashes the file.
pub(crate) async fn ensure_hash(message: &mut Message) -> Result<(), ClientError> {
    let Some(media) = message.media_mut() else {
        return Ok(());
    };
    if media.hash.is_some() {
        return Ok(());
    }

    let bytes = tokio::fs::read(&media.path)
        .await
        .map_err(|source| ClientError::Attachment {
            path: media.path.clone(),
            source,
        })?;
    let hash = content_hash(&bytes);
    debug!("hashed {} ({} bytes): {}", media.path.display(), bytes.len(), hash);
    media.hash = Some(hash);
    Ok(())
}
