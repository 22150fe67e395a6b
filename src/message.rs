use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Separator between segments of a hierarchical channel name.
pub const CHANNEL_SEPARATOR: &str = "::";

/// A message delivered to listeners.
///
/// Carries the channel it was published on plus an opaque structured
/// payload. The bus routes on the channel name only and never inspects or
/// validates payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    channel: Cow<'static, str>,
    payload: Value,
}

impl Message {
    /// Creates a message for `channel` carrying `payload`.
    #[must_use]
    pub fn new(channel: impl Into<Cow<'static, str>>, payload: Value) -> Self {
        Self { channel: channel.into(), payload }
    }

    /// The channel this message was published on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The structured payload, exactly as the publisher provided it.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the message, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Returns the root segment of a hierarchical channel name.
///
/// Channel names may be namespaced with [`CHANNEL_SEPARATOR`], e.g.
/// `"sensor::temp"`; the root segment identifies the namespace. Names
/// without a separator are their own root.
///
/// # Examples
/// ```rust
/// use sdk_event_bus::channel_root;
///
/// assert_eq!(channel_root("sensor::temp"), "sensor");
/// assert_eq!(channel_root("data"), "data");
/// ```
#[must_use]
pub fn channel_root(channel: &str) -> &str {
    channel.split(CHANNEL_SEPARATOR).next().unwrap_or_default()
}
