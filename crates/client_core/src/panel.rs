//! The button panel: binder, dispatcher and poller wired together.

use std::sync::Arc;

use shared::{
    domain::{ActivationEvent, Control, ControlKind, InputSource, PointerEvent, PowerState},
    protocol::StatusReport,
};
use tokio::sync::watch;
use tracing::info;

use crate::{
    binder::InputBinder,
    config::{Settings, SettingsError},
    dispatcher::{CommandDispatcher, PulseDurations},
    markers::{FeedbackSink, Markers},
    poller::{PollerHandle, StatusPoller},
    transport::{Actuator, HttpActuator},
};

pub struct Panel {
    binder: InputBinder,
    dispatcher: Arc<CommandDispatcher>,
    poller: Arc<StatusPoller>,
    poller_handle: Option<PollerHandle>,
}

impl Panel {
    /// Connect to the actuator named in `settings` and start polling.
    pub fn connect(
        settings: &Settings,
        sink: Arc<dyn FeedbackSink>,
    ) -> Result<Self, SettingsError> {
        let base = settings.actuator_base()?;
        let pulses = settings.pulse_durations()?;
        info!(actuator = %base, "starting button panel");
        Ok(Self::start(Arc::new(HttpActuator::new(base)), pulses, sink))
    }

    /// Wire up every control against `actuator` and start the poll loop.
    /// Must be called from within a tokio runtime.
    pub fn start(
        actuator: Arc<dyn Actuator>,
        pulses: PulseDurations,
        sink: Arc<dyn FeedbackSink>,
    ) -> Self {
        let markers = Arc::new(Markers::new(Arc::clone(&sink)));
        let dispatcher =
            CommandDispatcher::spawn(Arc::clone(&actuator), Arc::clone(&markers), pulses);
        let mut binder = InputBinder::new(markers);

        for control in Control::ALL {
            let on_activate = {
                let dispatcher = Arc::clone(&dispatcher);
                move |control: Control| dispatcher.activate(control)
            };
            match control.kind() {
                ControlKind::Hold => {
                    let dispatcher = Arc::clone(&dispatcher);
                    binder.bind(
                        control,
                        on_activate,
                        Some(Box::new(move |control: Control| dispatcher.deactivate(control))),
                    );
                }
                ControlKind::Pulse => binder.bind(control, on_activate, None),
            }
        }

        let poller = Arc::new(StatusPoller::new(actuator, sink));
        let poller_handle = Some(poller.spawn());

        Self {
            binder,
            dispatcher,
            poller,
            poller_handle,
        }
    }

    /// Feed one raw pointer event. Returns the activation it produced, if any.
    pub fn pointer(
        &mut self,
        control: Control,
        source: InputSource,
        event: PointerEvent,
    ) -> Option<ActivationEvent> {
        self.binder.pointer(control, source, event)
    }

    pub fn power_state(&self) -> PowerState {
        self.poller.power_state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PowerState> {
        self.poller.subscribe()
    }

    pub fn latest_report(&self) -> Option<StatusReport> {
        self.poller.latest_report()
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        self.dispatcher.markers().is_set(control)
    }

    pub fn pulses(&self) -> PulseDurations {
        self.dispatcher.pulses()
    }

    /// Stop polling and flush queued hold commands.
    ///
    /// Pulses already running are left to finish on their own tasks.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.poller_handle.take() {
            handle.stop().await;
        }
        self.dispatcher.shutdown().await;
        info!("button panel stopped");
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
