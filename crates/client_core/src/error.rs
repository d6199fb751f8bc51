//! Failure taxonomy for actuator round trips.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// Connect, DNS, timeout, or a broken body read.
    #[error("{command}: actuator unreachable: {reason}")]
    Transport {
        command: &'static str,
        reason: String,
    },
    /// The actuator answered, but not with the success status required.
    #[error("{command}: actuator answered HTTP {status}: {message}")]
    Status {
        command: &'static str,
        status: u16,
        message: String,
    },
    #[error("{command}: unexpected response body: {reason}")]
    Decode {
        command: &'static str,
        reason: String,
    },
    #[error("{command}: cannot build request url: {reason}")]
    Url {
        command: &'static str,
        reason: String,
    },
}

impl ActuatorError {
    pub fn command(&self) -> &'static str {
        match self {
            ActuatorError::Transport { command, .. }
            | ActuatorError::Status { command, .. }
            | ActuatorError::Decode { command, .. }
            | ActuatorError::Url { command, .. } => command,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ActuatorError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
