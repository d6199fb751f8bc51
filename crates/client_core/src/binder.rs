//! Input binder: raw pointer and touch events in, one activation pair out.
//!
//! Every control gets a [`PointerSession`] with exactly two transitions,
//! `begin` and `end`. A session that is already active ignores further
//! `begin`s and an idle session ignores `end`s, so a gesture can fire at most
//! one activation and at most one matching deactivation no matter how many
//! input sources report it. Browsers follow a touch gesture with emulated
//! mouse events; those are dropped for [`SYNTHETIC_MOUSE_WINDOW`] after the
//! last touch event on the control.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use shared::domain::{ActivationEvent, Control, InputSource, PointerEvent};
use tracing::debug;

use crate::markers::Markers;

/// How long after a touch event mouse events on the same control are ignored.
pub const SYNTHETIC_MOUSE_WINDOW: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Active(InputSource),
}

#[derive(Debug)]
pub struct PointerSession {
    state: SessionState,
    last_touch: Option<Instant>,
}

impl Default for PointerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_touch: None,
        }
    }

    pub fn feed(
        &mut self,
        source: InputSource,
        event: PointerEvent,
        now: Instant,
    ) -> Option<Transition> {
        match source {
            InputSource::Touch => self.last_touch = Some(now),
            InputSource::Mouse => {
                let emulated = self.last_touch.is_some_and(|touched| {
                    now.saturating_duration_since(touched) < SYNTHETIC_MOUSE_WINDOW
                });
                if emulated {
                    return None;
                }
            }
        }

        match (self.state, event) {
            (SessionState::Idle, PointerEvent::Down) => {
                self.state = SessionState::Active(source);
                Some(Transition::Begin)
            }
            (SessionState::Active(_), PointerEvent::Up | PointerEvent::Leave) => {
                self.state = SessionState::Idle;
                Some(Transition::End)
            }
            _ => None,
        }
    }
}

pub type Callback = Box<dyn Fn(Control) + Send + Sync>;

struct Binding {
    on_activate: Callback,
    on_deactivate: Option<Callback>,
    session: PointerSession,
}

/// Routes raw pointer input for each bound control to its callbacks.
///
/// Controls bound with a deactivation callback behave like a held key: the
/// binder sets their marker before `on_activate` and clears it before
/// `on_deactivate`. Controls bound without one fire on activation only and
/// leave their marker to the command they start.
pub struct InputBinder {
    markers: Arc<Markers>,
    bindings: HashMap<Control, Binding>,
}

impl InputBinder {
    pub fn new(markers: Arc<Markers>) -> Self {
        Self {
            markers,
            bindings: HashMap::new(),
        }
    }

    /// Register `control`. Binding it again replaces the earlier callbacks.
    pub fn bind(
        &mut self,
        control: Control,
        on_activate: impl Fn(Control) + Send + Sync + 'static,
        on_deactivate: Option<Callback>,
    ) {
        self.bindings.insert(
            control,
            Binding {
                on_activate: Box::new(on_activate),
                on_deactivate,
                session: PointerSession::new(),
            },
        );
    }

    /// A `Some` return means the event was consumed; hosts with a default
    /// touch action (scrolling, zoom) should suppress it for that event.
    pub fn pointer(
        &mut self,
        control: Control,
        source: InputSource,
        event: PointerEvent,
    ) -> Option<ActivationEvent> {
        self.pointer_at(control, source, event, Instant::now())
    }

    pub fn pointer_at(
        &mut self,
        control: Control,
        source: InputSource,
        event: PointerEvent,
        now: Instant,
    ) -> Option<ActivationEvent> {
        let Some(binding) = self.bindings.get_mut(&control) else {
            debug!(%control, "pointer event on unbound control");
            return None;
        };

        let transition = binding.session.feed(source, event, now);
        match transition {
            Some(Transition::Begin) => {
                if binding.on_deactivate.is_some() {
                    self.markers.set(control);
                }
                debug!(%control, ?source, "activate");
                (binding.on_activate)(control);
                Some(ActivationEvent::Activate(control))
            }
            Some(Transition::End) => {
                let on_deactivate = binding.on_deactivate.as_ref()?;
                self.markers.clear(control);
                debug!(%control, ?source, "deactivate");
                on_deactivate(control);
                Some(ActivationEvent::Deactivate(control))
            }
            None => {
                debug!(%control, ?source, ?event, "pointer event ignored");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/binder_tests.rs"]
mod tests;
