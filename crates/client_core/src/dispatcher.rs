//! Command dispatcher: turns activations into actuator commands.
//!
//! Hold commands (`PowerButton`) are fire-and-forget for the caller but go
//! through one ordered queue, so a release can never overtake its press.
//! Timed pulses run their four steps in strict order and refuse to start a
//! second time on a control whose pulse is still in flight.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use shared::{
    domain::{Control, ControlKind, PulseSpec},
    protocol::{HoldAccepted, PressRecord},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

use crate::{delivery::Delivery, markers::Markers, transport::Actuator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseDurations {
    pub short: PulseSpec,
    pub long: PulseSpec,
}

impl PulseDurations {
    pub fn for_control(&self, control: Control) -> Option<PulseSpec> {
        match control {
            Control::ShortPulse => Some(self.short),
            Control::LongPulse => Some(self.long),
            Control::PowerButton => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldCommand {
    Press,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HoldOutcome {
    Pressed(Delivery<Option<HoldAccepted>>),
    Released(Delivery<Option<PressRecord>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PulseOutcome {
    Completed {
        release: Delivery<Option<PressRecord>>,
        press: Delivery<Option<PressRecord>>,
    },
    /// A pulse on this control was still in flight; the activation was dropped.
    Busy,
    NotAPulse,
}

/// Send one hold command and log what the actuator said about it.
pub async fn deliver_hold(actuator: &dyn Actuator, command: HoldCommand) -> HoldOutcome {
    match command {
        HoldCommand::Press => {
            let delivery = Delivery::absorb(actuator.press().await);
            if let Delivery::Delivered(Some(accepted)) = &delivery {
                info!(
                    "button held; actuator auto-releases after {:.1}s",
                    accepted.timeout
                );
            }
            HoldOutcome::Pressed(delivery)
        }
        HoldCommand::Release => {
            let delivery = Delivery::absorb(actuator.release().await);
            if let Delivery::Delivered(Some(record)) = &delivery {
                log_press_record("release", record);
            }
            HoldOutcome::Released(delivery)
        }
    }
}

fn log_press_record(command: &'static str, record: &PressRecord) {
    info!(
        command,
        elapsed = record.elapsed,
        start_on = record.start_state,
        end_on = record.end_state,
        "button released after {:.3}s",
        record.elapsed
    );
}

/// One flag per control; set while a pulse on it is running.
#[derive(Default)]
struct InFlight([AtomicBool; 3]);

impl InFlight {
    fn flag(&self, control: Control) -> &AtomicBool {
        match control {
            Control::PowerButton => &self.0[0],
            Control::ShortPulse => &self.0[1],
            Control::LongPulse => &self.0[2],
        }
    }

    fn claim(&self, control: Control) -> Option<InFlightClaim<'_>> {
        let flag = self.flag(control);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightClaim { flag })
    }
}

struct InFlightClaim<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct CommandDispatcher {
    actuator: Arc<dyn Actuator>,
    markers: Arc<Markers>,
    pulses: PulseDurations,
    in_flight: InFlight,
    hold_tx: Mutex<Option<mpsc::UnboundedSender<HoldCommand>>>,
    hold_worker: Mutex<Option<JoinHandle<()>>>,
}

impl CommandDispatcher {
    /// Build the dispatcher and start its hold queue worker on the current
    /// tokio runtime.
    pub fn spawn(
        actuator: Arc<dyn Actuator>,
        markers: Arc<Markers>,
        pulses: PulseDurations,
    ) -> Arc<Self> {
        let (hold_tx, mut hold_rx) = mpsc::unbounded_channel::<HoldCommand>();
        let worker_actuator = Arc::clone(&actuator);
        let worker = tokio::spawn(async move {
            while let Some(command) = hold_rx.recv().await {
                let _ = deliver_hold(worker_actuator.as_ref(), command).await;
            }
            debug!("hold queue closed");
        });

        Arc::new(Self {
            actuator,
            markers,
            pulses,
            in_flight: InFlight::default(),
            hold_tx: Mutex::new(Some(hold_tx)),
            hold_worker: Mutex::new(Some(worker)),
        })
    }

    pub fn markers(&self) -> &Arc<Markers> {
        &self.markers
    }

    pub fn pulses(&self) -> PulseDurations {
        self.pulses
    }

    /// Queue a hold command. Never blocks; dropped once shut down.
    pub fn enqueue_hold(&self, command: HoldCommand) {
        let guard = self.hold_tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(command).is_err() {
                    debug!(?command, "hold queue worker gone; command dropped");
                }
            }
            None => debug!(?command, "dispatcher shut down; command dropped"),
        }
    }

    /// Route an activation. Pulses run on their own task.
    pub fn activate(self: &Arc<Self>, control: Control) {
        match control.kind() {
            ControlKind::Hold => self.enqueue_hold(HoldCommand::Press),
            ControlKind::Pulse => {
                let dispatcher = Arc::clone(self);
                tokio::spawn(async move {
                    let _ = dispatcher.run_pulse(control).await;
                });
            }
        }
    }

    pub fn deactivate(&self, control: Control) {
        match control.kind() {
            ControlKind::Hold => self.enqueue_hold(HoldCommand::Release),
            ControlKind::Pulse => debug!(%control, "pulse controls ignore deactivation"),
        }
    }

    /// Release, set marker, timed press (waited), clear marker.
    ///
    /// The marker is cleared by a guard, so it goes away whatever the timed
    /// press does, including when this future is dropped mid-flight.
    pub async fn run_pulse(&self, control: Control) -> PulseOutcome {
        let Some(pulse) = self.pulses.for_control(control) else {
            return PulseOutcome::NotAPulse;
        };
        let Some(_claim) = self.in_flight.claim(control) else {
            debug!(%control, "pulse already in flight; activation ignored");
            return PulseOutcome::Busy;
        };

        let release = Delivery::absorb(self.actuator.release().await);

        let press = {
            let _marker = self.markers.hold(control);
            debug!(%control, seconds = pulse.duration_seconds(), "timed press");
            Delivery::absorb(self.actuator.timed_press(pulse).await)
        };
        if let Delivery::Delivered(Some(record)) = &press {
            log_press_record("timed_press", record);
        }

        PulseOutcome::Completed { release, press }
    }

    /// Close the hold queue and wait until everything queued was sent.
    pub async fn shutdown(&self) {
        drop(
            self.hold_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let worker = self
            .hold_worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
