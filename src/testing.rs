//! Test support: invocation counting probes and per-test setup fixtures.
//!
//! Nothing here is used on a hot path; these types exist so tests can observe
//! hook invocations without hand-rolling atomics each time.

use crate::registry::{ConnectHook, PublishHook};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Cloneable atomic counter recording how many times a hook or setup action
/// ran. Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct InvocationCounter(Arc<AtomicU32>);

impl InvocationCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    /// A connect hook that increments this counter and discards the event.
    #[must_use]
    pub fn connect_hook(&self) -> ConnectHook {
        let probe = self.clone();
        Arc::new(move |_event, _client| probe.increment())
    }

    /// A publish hook that increments this counter and discards the event.
    #[must_use]
    pub fn publish_hook(&self) -> PublishHook {
        let probe = self.clone();
        Arc::new(move |_event, _client| probe.increment())
    }
}

/// Per-test fixture running a setup action before each case.
///
/// Each test constructs its own fixture, so counts never leak between tests
/// and no ordering between cases can affect an assertion. `before_each` runs
/// the setup action, then increments the counter by exactly one.
pub struct SetupFixture {
    counter: InvocationCounter,
    setup: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SetupFixture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: InvocationCounter::new(),
            setup: None,
        }
    }

    #[must_use]
    pub fn with_setup(setup: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            counter: InvocationCounter::new(),
            setup: Some(Box::new(setup)),
        }
    }

    pub fn before_each(&self) {
        if let Some(setup) = &self.setup {
            setup();
        }
        self.counter.increment();
    }

    /// Number of times `before_each` has run on this fixture.
    #[must_use]
    pub fn setups(&self) -> u32 {
        self.counter.count()
    }
}

impl Default for SetupFixture {
    fn default() -> Self {
        Self::new()
    }
}
