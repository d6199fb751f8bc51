use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body the actuator sends alongside a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("unknown control '{0}' (expected power, short or long)")]
    UnknownControl(String),
    #[error("pulse duration must be a positive, finite number of seconds, got {0}")]
    InvalidPulse(f64),
    #[error("unknown pointer event '{0}' (expected down, up or leave)")]
    UnknownPointerEvent(String),
    #[error("unknown input source '{0}' (expected mouse or touch)")]
    UnknownInputSource(String),
}
