//! Core identifier and ordering types shared across the hook layer.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a registered hook. Never reused within a registry's
/// lifetime.
pub type HookId = u64;

/// Dispatch priority for a registered hook.
///
/// Higher priorities are invoked first. Hooks registered with the same
/// priority are invoked in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 128,
            Self::High => 255,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// Quality of service level carried by publish events and will messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QoS {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl QoS {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::AtMostOnce => 0,
            Self::AtLeastOnce => 1,
            Self::ExactlyOnce => 2,
        }
    }
}
