use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PowerState;

/// Fixed status reconciliation period.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Commands understood by the actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    /// Start holding the button down until a `Release`.
    Press,
    /// Let go of the button. Harmless when nothing is held.
    Release,
    /// Press for `seconds`, auto-release, and only answer once done.
    TimedPress { seconds: f64 },
    Status,
}

impl ActuatorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ActuatorCommand::Press => "press",
            ActuatorCommand::Release => "release",
            ActuatorCommand::TimedPress { .. } => "timed_press",
            ActuatorCommand::Status => "status",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            ActuatorCommand::Status => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Path plus query string, relative to the actuator base address.
    ///
    /// The `wait` flag is sent bare (`&wait`), without a value.
    pub fn path_and_query(&self) -> String {
        match self {
            ActuatorCommand::Press => "press".to_string(),
            ActuatorCommand::Release => "release".to_string(),
            ActuatorCommand::TimedPress { seconds } => format!("press?t={seconds}&wait"),
            ActuatorCommand::Status => "status".to_string(),
        }
    }
}

/// Record of one completed press, as reported by the actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressRecord {
    pub pressed_at: DateTime<Utc>,
    /// Seconds the button was actually held.
    pub elapsed: f64,
    pub start_state: bool,
    pub end_state: bool,
}

/// Answer to a hold press: the actuator's own safety release timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldAccepted {
    pub timeout: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub on: bool,
    #[serde(default)]
    pub pressed: bool,
    #[serde(default)]
    pub running_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_press: Option<PressRecord>,
}

impl StatusReport {
    pub fn power_state(&self) -> PowerState {
        PowerState::from(self.on)
    }
}
