//! Client side of the remote power button.
//!
//! Gestures on the three controls come in through the [`binder`], become
//! actuator commands in the [`dispatcher`], and the [`poller`] keeps the
//! displayed power state in line with what the actuator reports.

pub mod binder;
pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod markers;
pub mod panel;
pub mod poller;
pub mod transport;

pub use binder::{InputBinder, PointerSession};
pub use config::{load_settings, Settings, SettingsError};
pub use delivery::Delivery;
pub use dispatcher::{CommandDispatcher, HoldCommand, PulseDurations, PulseOutcome};
pub use error::ActuatorError;
pub use markers::{FeedbackSink, Markers, NoopSink};
pub use panel::Panel;
pub use poller::{PollOutcome, StatusPoller, MAX_PENDING_POLLS};
pub use transport::{Actuator, HttpActuator};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
