//! Per-control "pressed" indicators and the sink that renders them.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::{Control, PowerState};

/// Receives every visible state change. Implemented by the UI layer.
pub trait FeedbackSink: Send + Sync {
    fn marker_changed(&self, control: Control, pressed: bool);
    fn power_changed(&self, state: PowerState);
}

/// Sink for hosts that render nothing.
pub struct NoopSink;

impl FeedbackSink for NoopSink {
    fn marker_changed(&self, _control: Control, _pressed: bool) {}
    fn power_changed(&self, _state: PowerState) {}
}

/// Visual feedback markers, one per control.
///
/// The sink only hears about real transitions: setting a set marker, or
/// clearing a clear one, is silent.
pub struct Markers {
    flags: [AtomicBool; 3],
    sink: Arc<dyn FeedbackSink>,
}

fn slot(control: Control) -> usize {
    match control {
        Control::PowerButton => 0,
        Control::ShortPulse => 1,
        Control::LongPulse => 2,
    }
}

impl Markers {
    pub fn new(sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            flags: Default::default(),
            sink,
        }
    }

    /// Returns whether the marker actually changed.
    pub fn set(&self, control: Control) -> bool {
        let was_set = self.flags[slot(control)].swap(true, Ordering::AcqRel);
        if !was_set {
            self.sink.marker_changed(control, true);
        }
        !was_set
    }

    /// Returns whether the marker actually changed.
    pub fn clear(&self, control: Control) -> bool {
        let was_set = self.flags[slot(control)].swap(false, Ordering::AcqRel);
        if was_set {
            self.sink.marker_changed(control, false);
        }
        was_set
    }

    pub fn is_set(&self, control: Control) -> bool {
        self.flags[slot(control)].load(Ordering::Acquire)
    }

    /// Set the marker for as long as the returned guard lives.
    pub fn hold(self: &Arc<Self>, control: Control) -> MarkerGuard {
        self.set(control);
        MarkerGuard {
            markers: Arc::clone(self),
            control,
        }
    }
}

/// Clears its marker when dropped, including on early return or task abort.
#[must_use = "the marker is cleared as soon as the guard is dropped"]
pub struct MarkerGuard {
    markers: Arc<Markers>,
    control: Control,
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        self.markers.clear(self.control);
    }
}
