// Outbox: the staging area one dispatch cycle consumes
// Queued messages, the receiver set, caller-injected receipt metadata and
// the pluggable composition-delay function.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::Message;

type CompositionFn = Box<dyn Fn(&Message) -> Duration + Send + Sync>;

/// Ordered staging area handed to the caller's closure during
/// [`crate::Client::send`]. Queue order and receiver order are delivery
/// order; both are cleared unconditionally when the cycle ends.
pub struct Outbox {
    messages: Vec<Message>,
    receivers: Vec<String>,
    metadata: BTreeMap<String, serde_json::Value>,
    composition: CompositionFn,
}

impl Outbox {
    pub(crate) fn new() -> Self {
        Outbox {
            messages: Vec::new(),
            receivers: Vec::new(),
            metadata: BTreeMap::new(),
            composition: Box::new(default_composition),
        }
    }

    /// Queue another message for this cycle.
    pub fn queue(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Add a receiver address. Insertion order is delivery order.
    pub fn to(&mut self, receiver: impl Into<String>) {
        self.receivers.push(receiver.into());
    }

    pub fn to_many<I, S>(&mut self, receivers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for receiver in receivers {
            self.to(receiver);
        }
    }

    /// Attach an arbitrary key/value pair; every pair is copied onto each
    /// receipt the cycle produces.
    pub fn inject(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Replace the composition-delay function. The pipeline sleeps for the
    /// returned duration between the composing and paused signals of every
    /// direct send; tests typically install `|_| Duration::ZERO`.
    pub fn set_composition<F>(&mut self, f: F)
    where
        F: Fn(&Message) -> Duration + Send + Sync + 'static,
    {
        self.composition = Box::new(f);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn message_mut(&mut self, index: usize) -> &mut Message {
        &mut self.messages[index]
    }

    pub(crate) fn receivers(&self) -> &[String] {
        &self.receivers
    }

    pub(crate) fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub(crate) fn composition_delay(&self, message: &Message) -> Duration {
        (self.composition)(message)
    }

    /// Drop everything staged for the cycle. The composition function is
    /// configuration, not cycle state, and survives.
    pub(crate) fn clear(&mut self) {
        self.messages.clear();
        self.receivers.clear();
        self.metadata.clear();
    }
}

/// Default typing pace: roughly 13 characters per second for text, clamped
/// so short messages still pause briefly and long ones don't stall the
/// cycle. Media gets a flat "picking a file" delay.
fn default_composition(message: &Message) -> Duration {
    match message {
        Message::Text { body } => {
            Duration::from_millis((body.chars().count() as u64 * 75).clamp(500, 5_000))
        }
        _ => Duration::from_millis(1_500),
    }
}
