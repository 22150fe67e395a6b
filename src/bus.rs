use crate::error::EventBusError;
use crate::message::Message;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Reserved channel name whose listeners receive every published message.
///
/// Wildcard listeners run after the published channel's own listeners, in
/// their own registration order. Publishing directly on this channel is
/// rejected.
pub const WILDCARD_CHANNEL: &str = "#";

/// Marker trait for callbacks that can be registered on the [`EventBus`].
///
/// Any `Fn(&Message)` that is `Send + Sync + 'static` automatically
/// implements this trait.
pub trait Listener: Fn(&Message) + Send + Sync + 'static {}
impl<F: Fn(&Message) + Send + Sync + 'static> Listener for F {}

/// Handle identifying a registered listener, used for removal.
///
/// Ids are unique per bus instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    callback: Arc<dyn Fn(&Message) + Send + Sync>,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry").field("id", &self.id).finish_non_exhaustive()
    }
}

/// A synchronous, thread-safe event bus routing messages by channel name.
///
/// Listeners are invoked in registration order. Dispatch is a plain
/// function call chain: [`EventBus::emit`] returns once every listener has
/// run, including any nested publishes those listeners perform. Clones
/// share the same listener registry.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    channels: Arc<RwLock<FxHashMap<String, Vec<ListenerEntry>>>>,
    next_listener_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` at the end of `channel`'s listener list.
    ///
    /// Registering on a previously unused channel implicitly creates it.
    /// The returned [`ListenerId`] can be passed to [`EventBus::off`].
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidChannel`] if `channel` is empty.
    ///
    /// # Examples
    /// ```rust
    /// use sdk_event_bus::EventBus;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), sdk_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.on("data", |msg| {
    ///     assert_eq!(msg.channel(), "data");
    /// })?;
    /// bus.emit("data", json!({ "payload": { "temp": 20, "wind": 10 } }))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn on<F: Listener>(
        &self,
        channel: impl Into<String>,
        listener: F,
    ) -> Result<ListenerId, EventBusError> {
        let channel = channel.into();
        validate_channel(&channel)?;

        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let entry = ListenerEntry { id, callback: Arc::new(listener) };

        let mut channels = self.channels.write();
        let listeners = match channels.entry(channel) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                trace!(channel = vacant.key().as_str(), "Initializing new event channel");
                vacant.insert(Vec::new())
            },
        };
        listeners.push(entry);

        Ok(id)
    }

    /// Registers `listener` on the wildcard channel, observing every
    /// published message after the channel's own listeners have run.
    ///
    /// # Errors
    /// Infallible in practice; shares the signature of [`EventBus::on`].
    ///
    /// # Examples
    /// ```rust
    /// use sdk_event_bus::EventBus;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), sdk_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.on_any(|msg| {
    ///     assert_eq!(msg.channel(), "event");
    /// })?;
    /// bus.emit("event", json!({ "eventName": "findSomething" }))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn on_any<F: Listener>(&self, listener: F) -> Result<ListenerId, EventBusError> {
        self.on(WILDCARD_CHANNEL, listener)
    }

    /// Removes the listener registered under `id` from `channel`.
    ///
    /// Removal during an in-flight publish does not affect that publish;
    /// the listener may still run once for a message already being
    /// dispatched.
    ///
    /// # Errors
    /// Returns [`EventBusError::ListenerNotFound`] if no listener with `id`
    /// is registered on `channel`.
    ///
    /// # Examples
    /// ```rust
    /// use sdk_event_bus::EventBus;
    ///
    /// # fn main() -> Result<(), sdk_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// let id = bus.on("data", |_| {})?;
    /// bus.off("data", id)?;
    /// assert_eq!(bus.listener_count("data"), 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn off(&self, channel: &str, id: ListenerId) -> Result<(), EventBusError> {
        let mut channels = self.channels.write();
        let Some(listeners) = channels.get_mut(channel) else {
            return Err(listener_not_found(channel, id));
        };
        let Some(index) = listeners.iter().position(|entry| entry.id == id) else {
            return Err(listener_not_found(channel, id));
        };
        listeners.remove(index);
        if listeners.is_empty() {
            channels.remove(channel);
        }
        trace!(channel, listener = id.0, "Listener removed");
        Ok(())
    }

    /// Removes a wildcard listener previously registered with
    /// [`EventBus::on_any`].
    ///
    /// # Errors
    /// Returns [`EventBusError::ListenerNotFound`] if `id` is not a
    /// registered wildcard listener.
    pub fn off_any(&self, id: ListenerId) -> Result<(), EventBusError> {
        self.off(WILDCARD_CHANNEL, id)
    }

    /// Publishes `payload` on `channel`.
    ///
    /// Invokes every listener of `channel` in registration order, then
    /// every wildcard listener, and returns the number of listeners
    /// invoked. A channel with no listeners is a silent no-op returning
    /// `Ok(0)`. Dispatch is depth-first: a listener may itself publish,
    /// and that nested publish completes before the next listener of this
    /// one runs. If a listener panics, the panic unwinds to the caller and
    /// the remaining listeners of this publish are skipped.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidChannel`] if `channel` is empty or
    /// the wildcard channel.
    ///
    /// # Examples
    /// ```rust
    /// use sdk_event_bus::EventBus;
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), sdk_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.on("event", |msg| {
    ///     assert_eq!(msg.payload()["eventName"], "findSomething");
    ///     assert_eq!(msg.payload()["payload"]["location"], "here");
    /// })?;
    /// let delivered = bus.emit("event", json!({
    ///     "eventName": "findSomething",
    ///     "payload": { "location": "here" }
    /// }))?;
    /// assert_eq!(delivered, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn emit(
        &self,
        channel: impl Into<Cow<'static, str>>,
        payload: Value,
    ) -> Result<usize, EventBusError> {
        self.emit_message(Message::new(channel, payload))
    }

    /// Publishes `payload` on `channel`.
    ///
    /// This is a convenience alias for [`EventBus::emit`].
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidChannel`] if `channel` is empty or
    /// the wildcard channel.
    pub fn send(
        &self,
        channel: impl Into<Cow<'static, str>>,
        payload: Value,
    ) -> Result<usize, EventBusError> {
        self.emit(channel, payload)
    }

    /// Publishes a pre-built [`Message`] without re-wrapping.
    ///
    /// # Errors
    /// Returns [`EventBusError::InvalidChannel`] if the message's channel
    /// is empty or the wildcard channel.
    ///
    /// # Examples
    /// ```rust
    /// use sdk_event_bus::{EventBus, Message};
    /// use serde_json::json;
    ///
    /// # fn main() -> Result<(), sdk_event_bus::EventBusError> {
    /// let bus = EventBus::new();
    /// bus.emit_message(Message::new("alert", json!({ "alert": "hot" })))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn emit_message(&self, message: Message) -> Result<usize, EventBusError> {
        let channel = message.channel();
        validate_channel(channel)?;
        if channel == WILDCARD_CHANNEL {
            return Err(EventBusError::InvalidChannel {
                message: "cannot publish on the wildcard channel".into(),
                context: Some(WILDCARD_CHANNEL.into()),
            });
        }

        // Snapshot under the read lock, invoke after releasing it, so a
        // listener may re-enter `emit` without deadlock. Listeners added or
        // removed mid-publish affect only subsequent publishes.
        let callbacks: Vec<Arc<dyn Fn(&Message) + Send + Sync>> = {
            let channels = self.channels.read();
            let direct = channels.get(channel).into_iter().flatten();
            let wildcard = channels.get(WILDCARD_CHANNEL).into_iter().flatten();
            direct.chain(wildcard).map(|entry| Arc::clone(&entry.callback)).collect()
        };

        if callbacks.is_empty() {
            trace!(channel, "Message dropped: no registered listeners");
            return Ok(0);
        }

        for callback in &callbacks {
            callback(&message);
        }
        trace!(channel = message.channel(), count = callbacks.len(), "Message dispatched");
        Ok(callbacks.len())
    }

    /// Number of listeners currently registered on `channel`.
    ///
    /// Wildcard listeners are not included unless `channel` is
    /// [`WILDCARD_CHANNEL`] itself.
    #[must_use]
    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.read().get(channel).map_or(0, Vec::len)
    }

    /// Drops every channel together with its listeners.
    ///
    /// Returns the number of channels that were cleared.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut channels = self.channels.write();
        let count = channels.len();
        channels.clear();
        count
    }
}

fn validate_channel(channel: &str) -> Result<(), EventBusError> {
    if channel.is_empty() {
        return Err(EventBusError::InvalidChannel {
            message: "channel name must be non-empty".into(),
            context: None,
        });
    }
    Ok(())
}

fn listener_not_found(channel: &str, id: ListenerId) -> EventBusError {
    EventBusError::ListenerNotFound {
        message: format!("listener {} is not registered", id.0).into(),
        context: Some(channel.to_owned().into()),
    }
}
