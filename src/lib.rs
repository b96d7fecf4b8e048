//! # MQTT broker hook streams
//!
//! Bridges callback-style MQTT broker lifecycle hooks into async Rust. A
//! broker host fires hooks into a [`HookRegistry`]; consumers take them as
//! futures and streams instead of registering callbacks by hand:
//!
//! - [`stream::broker_starts`] — a one-shot await point for broker start
//! - [`stream::client_connects`] — every accepted CONNECT, with client data
//! - [`stream::publish_receiveds`] — every inbound PUBLISH, with client data
//! - [`scheduler::scheduleds`] — periodic ticks on a fixed [`Schedule`]
//!
//! Dropping a stream unregisters its hook, so consumers never leak
//! registrations.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use mqtt_hooks::{scheduler, stream, HookRegistry, Priority, Schedule};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> mqtt_hooks::Result<()> {
//!     let registry = Arc::new(HookRegistry::new());
//!
//!     let started = stream::broker_starts(&registry, Priority::Medium)?;
//!     let mut connects = stream::client_connects(&registry, Priority::Medium)?;
//!     let mut ticks = scheduler::scheduleds(
//!         &registry,
//!         Schedule::new(Duration::from_secs(60))?,
//!     )?;
//!
//!     tokio::spawn(async move {
//!         while let Some((_event, client)) = connects.recv().await {
//!             println!("client {} connected", client.client_id);
//!         }
//!     });
//!     tokio::spawn(async move {
//!         while let Some(tick) = ticks.recv().await {
//!             println!("housekeeping run {}", tick.sequence);
//!         }
//!     });
//!
//!     // The broker host drives the registry; from here the hooks above
//!     // observe its lifecycle.
//!     started.wait().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod events;
pub mod registry;
pub mod scheduler;
pub mod stream;
pub mod testing;
pub mod types;

pub use error::{HookError, Result};
pub use events::{ClientData, ConnectEvent, PublishEvent, SslClientCertificate, WillMessage};
pub use registry::{BrokerStartHook, ConnectHook, HookRegistry, PublishHook};
pub use scheduler::{Schedule, Tick};
pub use stream::{BrokerStart, HookStream};
pub use types::{HookId, Priority, QoS};
