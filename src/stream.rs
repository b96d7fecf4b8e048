//! Adapters turning registered hooks into async consumption.
//!
//! Each adapter registers a hook that forwards events into a channel and
//! returns the receiving half. Dropping the returned value unregisters the
//! hook, so no events are delivered to a consumer that went away.
//!
//! ```rust,no_run
//! use mqtt_hooks::{stream, HookRegistry, Priority};
//! use std::sync::Arc;
//!
//! # async fn demo() -> mqtt_hooks::Result<()> {
//! let registry = Arc::new(HookRegistry::new());
//!
//! let mut publishes = stream::publish_receiveds(&registry, Priority::Medium)?;
//! tokio::spawn(async move {
//!     while let Some((event, client)) = publishes.recv().await {
//!         println!("{} published on {}", client.client_id, event.topic);
//!     }
//! });
//! # Ok(())
//! # }
//! ```

use crate::error::{HookError, Result};
use crate::events::{ClientData, ConnectEvent, PublishEvent};
use crate::registry::HookRegistry;
use crate::types::{HookId, Priority};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Unregisters the underlying hook when the consumer side is dropped.
pub(crate) struct HookGuard {
    id: HookId,
    registry: Weak<HookRegistry>,
}

impl HookGuard {
    pub(crate) fn new(id: HookId, registry: &Arc<HookRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    fn id(&self) -> HookId {
        self.id
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            trace!(id = self.id, "consumer dropped, unregistering hook");
            // Already gone if the registry was cleared or closed.
            let _ = registry.remove(self.id);
        }
    }
}

/// Receiving half of a hook adapter.
///
/// Events dispatched before the first `recv` are buffered. `recv` yields
/// `None` once the registry has been dropped, cleared or closed.
pub struct HookStream<T> {
    rx: mpsc::UnboundedReceiver<T>,
    guard: HookGuard,
}

impl<T> HookStream<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<T>, guard: HookGuard) -> Self {
        Self { rx, guard }
    }

    /// Receives the next event, waiting if none is buffered.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns a buffered event without waiting, or `None` if none is ready.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Id of the underlying hook, usable with [`HookRegistry::remove`].
    #[must_use]
    pub fn hook_id(&self) -> HookId {
        self.guard.id()
    }
}

/// One-shot await point for broker start.
pub struct BrokerStart {
    rx: oneshot::Receiver<()>,
    guard: HookGuard,
}

impl BrokerStart {
    /// Id of the underlying hook, usable with [`HookRegistry::remove`].
    #[must_use]
    pub fn hook_id(&self) -> HookId {
        self.guard.id()
    }

    /// Resolves when the broker-start hook fires.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::RegistryClosed`] if the registry goes away before
    /// the broker starts.
    pub async fn wait(self) -> Result<()> {
        let Self { rx, guard } = self;
        let fired = rx.await;
        drop(guard);
        fired.map_err(|_| HookError::RegistryClosed)
    }
}

/// Registers a broker-start hook and returns an await point for it.
///
/// # Errors
///
/// Returns [`HookError::RegistryClosed`] if the registry has been closed.
pub fn broker_starts(registry: &Arc<HookRegistry>, priority: Priority) -> Result<BrokerStart> {
    let (tx, rx) = oneshot::channel();
    let id = registry.add_broker_start(
        priority,
        Box::new(move || {
            let _ = tx.send(());
        }),
    )?;
    Ok(BrokerStart {
        rx,
        guard: HookGuard::new(id, registry),
    })
}

/// Registers a connect hook and returns its events as a stream.
///
/// Two streams registered on the same registry both observe every connect;
/// they are independent hooks.
///
/// # Errors
///
/// Returns [`HookError::RegistryClosed`] if the registry has been closed.
pub fn client_connects(
    registry: &Arc<HookRegistry>,
    priority: Priority,
) -> Result<HookStream<(ConnectEvent, ClientData)>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = registry.add_connect(
        priority,
        Arc::new(move |event, client| {
            // Receiver gone means the guard is about to unregister us.
            let _ = tx.send((event, client));
        }),
    )?;
    Ok(HookStream::new(rx, HookGuard::new(id, registry)))
}

/// Registers a publish hook and returns its events as a stream.
///
/// # Errors
///
/// Returns [`HookError::RegistryClosed`] if the registry has been closed.
pub fn publish_receiveds(
    registry: &Arc<HookRegistry>,
    priority: Priority,
) -> Result<HookStream<(PublishEvent, ClientData)>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = registry.add_publish(
        priority,
        Arc::new(move |event, client| {
            let _ = tx.send((event, client));
        }),
    )?;
    Ok(HookStream::new(rx, HookGuard::new(id, registry)))
}
