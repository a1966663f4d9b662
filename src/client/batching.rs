// Receiver batching: direct sends vs. bulk chunks
// Small receiver sets go out one gateway call per address; anything larger
// is chunked and delivered through the gateway's broadcast variants.

use log::debug;

/// Receiver sets up to this size are sent directly, one call per address.
pub const DIRECT_SEND_LIMIT: usize = 10;

/// One delivery target of a dispatch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchTarget {
    /// A single address, reached via the single-target gateway operations.
    Single(String),
    /// A chunk of addresses, reached via the broadcast variants.
    Bulk(Vec<String>),
}

impl DispatchTarget {
    /// Receipt-facing descriptor: the address, or the joined chunk.
    pub fn descriptor(&self) -> String {
        match self {
            DispatchTarget::Single(to) => to.clone(),
            DispatchTarget::Bulk(to) => to.join(", "),
        }
    }
}

/// Split `receivers` into dispatch targets, preserving order.
///
/// Returns the targets plus whether bulk mode is engaged for the cycle.
/// With `n` receivers over the direct-send limit the result is
/// `ceil(n / limit)` chunks of at most `limit` addresses; the last chunk may
/// be smaller.
pub(crate) fn plan(receivers: &[String], limit: usize) -> (Vec<DispatchTarget>, bool) {
    if receivers.len() <= DIRECT_SEND_LIMIT {
        let targets = receivers
            .iter()
            .cloned()
            .map(DispatchTarget::Single)
            .collect();
        return (targets, false);
    }

    let limit = limit.max(1);
    let targets: Vec<DispatchTarget> = receivers
        .chunks(limit)
        .map(|chunk| DispatchTarget::Bulk(chunk.to_vec()))
        .collect();
    debug!(
        "bulk mode engaged: {} receivers over {} chunks (limit {})",
        receivers.len(),
        targets.len(),
        limit
    );
    (targets, true)
}
