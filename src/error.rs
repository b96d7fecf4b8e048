use crate::types::HookId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HookError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("Hook registry closed")]
    RegistryClosed,

    #[error("Hook not found: {0}")]
    HookNotFound(HookId),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}
