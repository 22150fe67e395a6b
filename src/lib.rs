//! # Event Bus
//!
//! A synchronous, named-channel event bus for publish/subscribe SDK
//! surfaces.
//!
//! ## Overview
//!
//! Provides a centralized [`EventBus`] that routes messages by channel name
//! to listeners invoked in registration order. Dispatch is a plain
//! synchronous call chain: a listener may itself publish, and the nested
//! publish completes before the outer publish moves on to its next
//! listener (depth-first).
//!
//! ## Features
//!
//! * **Named channels**: arbitrary string channels, created implicitly on
//!   first registration.
//! * **Ordered dispatch**: first registered, first invoked, per channel.
//! * **Re-entrant publish**: listeners may emit further messages
//!   synchronously without deadlock.
//! * **Wildcard**: listeners on [`WILDCARD_CHANNEL`] observe every message.
//! * **Thread-safe**: `FxHashMap` + `parking_lot::RwLock`; clones share a
//!   single registry.
//!
//! # Example
//!
//! ```rust
//! use sdk_event_bus::{EventBus, EventBusError};
//! use serde_json::json;
//!
//! fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!
//!     bus.on("data", |_| println!("data received"))?;
//!
//!     let alerts = bus.clone();
//!     bus.on("data", move |msg| {
//!         let temp = msg.payload()["payload"]["temp"].as_f64();
//!         if temp.is_some_and(|t| t > 30.0) {
//!             let _ = alerts.emit("alert", json!({ "alert": "hot" }));
//!         }
//!     })?;
//!
//!     bus.on("alert", |_| println!("alert received"))?;
//!
//!     // Logs "data received", then "alert received", before send returns.
//!     bus.send("data", json!({ "payload": { "temp": 35 } }))?;
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod message;

pub use bus::{EventBus, Listener, ListenerId, WILDCARD_CHANNEL};
pub use error::{EventBusError, EventBusErrorExt};
pub use message::{CHANNEL_SEPARATOR, Message, channel_root};
