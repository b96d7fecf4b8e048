//! The hook registry: typed broker lifecycle callbacks with priority ordering.
//!
//! A broker host owns a [`HookRegistry`] and drives it from its own lifecycle:
//! [`HookRegistry::fire_broker_start`] once the listeners are up,
//! [`HookRegistry::dispatch_connect`] per accepted CONNECT and
//! [`HookRegistry::dispatch_publish`] per inbound PUBLISH. Consumers register
//! callbacks directly or through the adapters in [`crate::stream`].
//!
//! Tables are guarded by a synchronous lock so that hooks can be unregistered
//! from `Drop` implementations. Dispatch clones the callback handles out of
//! the lock before invoking them, so a callback may itself register or remove
//! hooks without deadlocking.

use crate::error::{HookError, Result};
use crate::events::{ClientData, ConnectEvent, PublishEvent};
use crate::types::{HookId, Priority};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

/// Callback invoked once when the broker has started.
pub type BrokerStartHook = Box<dyn FnOnce() + Send + Sync>;

/// Callback invoked for every accepted client connection.
pub type ConnectHook = Arc<dyn Fn(ConnectEvent, ClientData) + Send + Sync>;

/// Callback invoked for every publish received by the broker.
pub type PublishHook = Arc<dyn Fn(PublishEvent, ClientData) + Send + Sync>;

struct Entry<H> {
    id: HookId,
    priority: Priority,
    hook: H,
}

#[derive(Default)]
struct Tables {
    closed: bool,
    broker_start: Vec<Entry<BrokerStartHook>>,
    connect: Vec<Entry<ConnectHook>>,
    publish: Vec<Entry<PublishHook>>,
    scheduled: Vec<(HookId, AbortHandle)>,
}

impl Tables {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(HookError::RegistryClosed);
        }
        Ok(())
    }

    fn abort_scheduled(&mut self) {
        for (id, handle) in self.scheduled.drain(..) {
            trace!(id, "aborting scheduled hook task");
            handle.abort();
        }
    }

    fn clear(&mut self) {
        self.broker_start.clear();
        self.connect.clear();
        self.publish.clear();
        self.abort_scheduled();
    }
}

/// Registry of broker lifecycle hooks.
pub struct HookRegistry {
    tables: RwLock<Tables>,
    next_id: AtomicU64,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> HookId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Registers a one-shot hook invoked on broker start.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::RegistryClosed`] if the registry has been closed.
    pub fn add_broker_start(&self, priority: Priority, hook: BrokerStartHook) -> Result<HookId> {
        let id = self.allocate_id();
        let mut tables = self.tables.write();
        tables.ensure_open()?;
        tables.broker_start.push(Entry { id, priority, hook });
        tables
            .broker_start
            .sort_by_key(|entry| Reverse(entry.priority));
        debug!(id, ?priority, "registered broker start hook");
        Ok(id)
    }

    /// Registers a hook invoked for every accepted client connection.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::RegistryClosed`] if the registry has been closed.
    pub fn add_connect(&self, priority: Priority, hook: ConnectHook) -> Result<HookId> {
        let id = self.allocate_id();
        let mut tables = self.tables.write();
        tables.ensure_open()?;
        tables.connect.push(Entry { id, priority, hook });
        tables.connect.sort_by_key(|entry| Reverse(entry.priority));
        debug!(id, ?priority, "registered connect hook");
        Ok(id)
    }

    /// Registers a hook invoked for every publish received by the broker.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::RegistryClosed`] if the registry has been closed.
    pub fn add_publish(&self, priority: Priority, hook: PublishHook) -> Result<HookId> {
        let id = self.allocate_id();
        let mut tables = self.tables.write();
        tables.ensure_open()?;
        tables.publish.push(Entry { id, priority, hook });
        tables.publish.sort_by_key(|entry| Reverse(entry.priority));
        debug!(id, ?priority, "registered publish hook");
        Ok(id)
    }

    /// Records a spawned scheduled-hook task so the registry can abort it on
    /// removal or shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::RegistryClosed`] if the registry has been closed.
    /// The task is aborted in that case, since nothing will track it.
    pub(crate) fn add_scheduled(&self, handle: AbortHandle) -> Result<HookId> {
        let id = self.allocate_id();
        let mut tables = self.tables.write();
        if tables.closed {
            handle.abort();
            return Err(HookError::RegistryClosed);
        }
        tables.scheduled.push((id, handle));
        debug!(id, "registered scheduled hook");
        Ok(id)
    }

    /// Removes a hook of any kind by id. After this returns `Ok`, the hook
    /// observes no further events.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::HookNotFound`] if no hook with this id is
    /// registered.
    pub fn remove(&self, id: HookId) -> Result<()> {
        let mut tables = self.tables.write();

        let before = tables.broker_start.len();
        tables.broker_start.retain(|entry| entry.id != id);
        let mut removed = tables.broker_start.len() < before;

        let before = tables.connect.len();
        tables.connect.retain(|entry| entry.id != id);
        removed |= tables.connect.len() < before;

        let before = tables.publish.len();
        tables.publish.retain(|entry| entry.id != id);
        removed |= tables.publish.len() < before;

        if let Some(pos) = tables.scheduled.iter().position(|(sid, _)| *sid == id) {
            let (_, handle) = tables.scheduled.swap_remove(pos);
            handle.abort();
            removed = true;
        }

        if removed {
            debug!(id, "removed hook");
            Ok(())
        } else {
            Err(HookError::HookNotFound(id))
        }
    }

    /// Total number of registered hooks, scheduled hooks included.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        let tables = self.tables.read();
        tables.broker_start.len()
            + tables.connect.len()
            + tables.publish.len()
            + tables.scheduled.len()
    }

    /// Removes all hooks and aborts all scheduled tasks. The registry stays
    /// open for new registrations.
    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.clear();
        debug!("cleared hook registry");
    }

    /// Removes all hooks and rejects further registrations.
    pub fn close(&self) {
        let mut tables = self.tables.write();
        tables.closed = true;
        tables.clear();
        debug!("closed hook registry");
    }

    /// Invokes all pending broker-start hooks, highest priority first.
    ///
    /// Each hook fires at most once: hooks invoked here are consumed, so a
    /// later call only reaches hooks registered since.
    pub fn fire_broker_start(&self) {
        let entries: Vec<Entry<BrokerStartHook>> = {
            let mut tables = self.tables.write();
            tables.broker_start.drain(..).collect()
        };

        trace!(count = entries.len(), "firing broker start hooks");
        for entry in entries {
            (entry.hook)();
        }
    }

    /// Invokes all connect hooks for an accepted CONNECT, highest priority
    /// first. Ties are invoked in registration order.
    pub fn dispatch_connect(&self, event: &ConnectEvent, client: &ClientData) {
        let hooks: Vec<ConnectHook> = {
            let tables = self.tables.read();
            tables
                .connect
                .iter()
                .map(|entry| Arc::clone(&entry.hook))
                .collect()
        };

        trace!(
            client_id = %client.client_id,
            count = hooks.len(),
            "dispatching connect event"
        );
        for hook in hooks {
            hook(event.clone(), client.clone());
        }
    }

    /// Invokes all publish hooks for an inbound PUBLISH, highest priority
    /// first. Ties are invoked in registration order.
    pub fn dispatch_publish(&self, event: &PublishEvent, client: &ClientData) {
        let hooks: Vec<PublishHook> = {
            let tables = self.tables.read();
            tables
                .publish
                .iter()
                .map(|entry| Arc::clone(&entry.hook))
                .collect()
        };

        trace!(
            client_id = %client.client_id,
            topic = %event.topic,
            count = hooks.len(),
            "dispatching publish event"
        );
        for hook in hooks {
            hook(event.clone(), client.clone());
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HookRegistry {
    fn drop(&mut self) {
        self.tables.write().abort_scheduled();
    }
}
