use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the three on-screen controls wired to the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Press-and-hold: pressed for as long as the gesture lasts.
    PowerButton,
    ShortPulse,
    LongPulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Hold,
    Pulse,
}

impl Control {
    pub const ALL: [Control; 3] = [Control::PowerButton, Control::ShortPulse, Control::LongPulse];

    pub fn kind(self) -> ControlKind {
        match self {
            Control::PowerButton => ControlKind::Hold,
            Control::ShortPulse | Control::LongPulse => ControlKind::Pulse,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::PowerButton => "power",
            Control::ShortPulse => "short",
            Control::LongPulse => "long",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Control {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power" | "power_button" => Ok(Control::PowerButton),
            "short" | "short_pulse" => Ok(Control::ShortPulse),
            "long" | "long_pulse" => Ok(Control::LongPulse),
            other => Err(DomainError::UnknownControl(other.to_string())),
        }
    }
}

/// Duration attached to a pulse control. Always positive, finite and small
/// enough to be held as a [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSpec {
    duration_seconds: f64,
}

impl PulseSpec {
    pub fn new(duration_seconds: f64) -> Result<Self, DomainError> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(DomainError::InvalidPulse(duration_seconds));
        }
        Duration::try_from_secs_f64(duration_seconds)
            .map_err(|_| DomainError::InvalidPulse(duration_seconds))?;
        Ok(Self { duration_seconds })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// Actuator-wide power state as last observed by a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    #[default]
    Off,
    On,
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on {
            PowerState::On
        } else {
            PowerState::Off
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::On => f.write_str("on"),
            PowerState::Off => f.write_str("off"),
        }
    }
}

/// Device-independent outcome of a gesture on a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEvent {
    Activate(Control),
    Deactivate(Control),
}

/// Physical input modality a raw pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Mouse,
    Touch,
}

impl FromStr for InputSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mouse" => Ok(InputSource::Mouse),
            "touch" => Ok(InputSource::Touch),
            other => Err(DomainError::UnknownInputSource(other.to_string())),
        }
    }
}

/// Raw pointer transition as delivered by a platform input source.
///
/// `Leave` only exists for the mouse; a touch that slides off the control
/// still ends with `Up`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Up,
    Leave,
}

impl FromStr for PointerEvent {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "down" | "start" => Ok(PointerEvent::Down),
            "up" | "end" => Ok(PointerEvent::Up),
            "leave" => Ok(PointerEvent::Leave),
            other => Err(DomainError::UnknownPointerEvent(other.to_string())),
        }
    }
}
