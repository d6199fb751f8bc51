//! Best-effort delivery: failures are logged and absorbed, never raised.

use tracing::warn;

use crate::error::ActuatorError;

/// Result of a fire-and-forget round trip.
///
/// Every dispatcher and poller operation reports through this type instead of
/// `Result`, so a failure never propagates into the UI layer.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<T> {
    Delivered(T),
    /// The round trip failed; the failure was logged and swallowed.
    Absorbed(ActuatorError),
}

impl<T> Delivery<T> {
    pub fn absorb(result: Result<T, ActuatorError>) -> Self {
        match result {
            Ok(value) => Delivery::Delivered(value),
            Err(err) => {
                warn!(command = err.command(), "absorbed actuator failure: {err}");
                Delivery::Absorbed(err)
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }

    pub fn delivered(self) -> Option<T> {
        match self {
            Delivery::Delivered(value) => Some(value),
            Delivery::Absorbed(_) => None,
        }
    }

    pub fn absorbed(&self) -> Option<&ActuatorError> {
        match self {
            Delivery::Delivered(_) => None,
            Delivery::Absorbed(err) => Some(err),
        }
    }
}
