//! Scripted actuator and recording sink shared by the unit tests.

use std::{
    collections::{HashSet, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{Control, PowerState, PulseSpec},
    protocol::{HoldAccepted, PressRecord, StatusReport},
};
use tokio::sync::Notify;

use crate::{error::ActuatorError, markers::FeedbackSink, transport::Actuator};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    /// A command round trip started.
    Call(&'static str),
    /// A timed press started with this duration.
    TimedCall(f64),
    /// A command round trip finished, successfully or not.
    Done(&'static str),
    Marker(Control, bool),
    Power(PowerState),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<Entry>>>);

impl Journal {
    pub(crate) fn push(&self, entry: Entry) {
        self.0.lock().expect("journal").push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<Entry> {
        self.0.lock().expect("journal").clone()
    }

    pub(crate) fn marker_entries(&self, control: Control) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|entry| matches!(entry, Entry::Marker(c, _) if *c == control))
            .collect()
    }

    pub(crate) fn power_entries(&self) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|entry| matches!(entry, Entry::Power(_)))
            .collect()
    }

    pub(crate) fn calls(&self) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|entry| matches!(entry, Entry::Call(_) | Entry::TimedCall(_)))
            .collect()
    }

    /// Calls other than status polls.
    pub(crate) fn commands(&self) -> Vec<Entry> {
        self.calls()
            .into_iter()
            .filter(|entry| *entry != Entry::Call("status"))
            .collect()
    }

    /// Wait (on the tokio clock) until `entry` shows up.
    pub(crate) async fn wait_for(&self, entry: Entry) {
        for _ in 0..1000 {
            if self.entries().contains(&entry) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("journal never recorded {entry:?}: {:?}", self.entries());
    }
}

pub(crate) struct RecordingSink {
    journal: Journal,
}

impl RecordingSink {
    pub(crate) fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl FeedbackSink for RecordingSink {
    fn marker_changed(&self, control: Control, pressed: bool) {
        self.journal.push(Entry::Marker(control, pressed));
    }

    fn power_changed(&self, state: PowerState) {
        self.journal.push(Entry::Power(state));
    }
}

pub(crate) fn status_error(code: u16) -> ActuatorError {
    ActuatorError::Status {
        command: "status",
        status: code,
        message: "scripted failure".to_string(),
    }
}

pub(crate) fn report(on: bool) -> StatusReport {
    StatusReport {
        on,
        pressed: false,
        running_since: None,
        last_press: None,
    }
}

pub(crate) struct FakeActuator {
    journal: Journal,
    failing: Mutex<HashSet<&'static str>>,
    statuses: Mutex<VecDeque<Result<StatusReport, ActuatorError>>>,
    timed_press_gate: Option<Arc<Notify>>,
    press_gate: Option<Arc<Notify>>,
    status_gate: Option<Arc<Notify>>,
}

impl FakeActuator {
    pub(crate) fn new(journal: Journal) -> Self {
        Self {
            journal,
            failing: Mutex::new(HashSet::new()),
            statuses: Mutex::new(VecDeque::new()),
            timed_press_gate: None,
            press_gate: None,
            status_gate: None,
        }
    }

    /// Timed presses block until the gate is notified.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.timed_press_gate = Some(gate);
        self
    }

    /// Hold presses block until the gate is notified.
    pub(crate) fn gated_press(mut self, gate: Arc<Notify>) -> Self {
        self.press_gate = Some(gate);
        self
    }

    /// Status polls block until the gate is notified.
    pub(crate) fn gated_status(mut self, gate: Arc<Notify>) -> Self {
        self.status_gate = Some(gate);
        self
    }

    pub(crate) fn fail(self, command: &'static str) -> Self {
        self.failing.lock().expect("failing").insert(command);
        self
    }

    pub(crate) fn script_status(&self, result: Result<StatusReport, ActuatorError>) {
        self.statuses.lock().expect("statuses").push_back(result);
    }

    fn outcome(&self, command: &'static str) -> Result<(), ActuatorError> {
        if self.failing.lock().expect("failing").contains(command) {
            return Err(ActuatorError::Transport {
                command,
                reason: "scripted network failure".to_string(),
            });
        }
        Ok(())
    }
}

fn press_record(elapsed: f64) -> PressRecord {
    PressRecord {
        pressed_at: Utc::now(),
        elapsed,
        start_state: false,
        end_state: true,
    }
}

#[async_trait]
impl Actuator for FakeActuator {
    async fn press(&self) -> Result<Option<HoldAccepted>, ActuatorError> {
        self.journal.push(Entry::Call("press"));
        if let Some(gate) = &self.press_gate {
            gate.notified().await;
        } else {
            tokio::task::yield_now().await;
        }
        let result = self.outcome("press").map(|()| Some(HoldAccepted { timeout: 20.0 }));
        self.journal.push(Entry::Done("press"));
        result
    }

    async fn release(&self) -> Result<Option<PressRecord>, ActuatorError> {
        self.journal.push(Entry::Call("release"));
        tokio::task::yield_now().await;
        let result = self.outcome("release").map(|()| None);
        self.journal.push(Entry::Done("release"));
        result
    }

    async fn timed_press(&self, pulse: PulseSpec) -> Result<Option<PressRecord>, ActuatorError> {
        self.journal.push(Entry::TimedCall(pulse.duration_seconds()));
        if let Some(gate) = &self.timed_press_gate {
            gate.notified().await;
        } else {
            tokio::task::yield_now().await;
        }
        let result = self
            .outcome("timed_press")
            .map(|()| Some(press_record(pulse.duration_seconds())));
        self.journal.push(Entry::Done("timed_press"));
        result
    }

    async fn status(&self) -> Result<StatusReport, ActuatorError> {
        self.journal.push(Entry::Call("status"));
        if let Some(gate) = &self.status_gate {
            gate.notified().await;
        }
        let scripted = self.statuses.lock().expect("statuses").pop_front();
        let result = match scripted {
            Some(result) => result,
            None => self.outcome("status").map(|()| report(false)),
        };
        self.journal.push(Entry::Done("status"));
        result
    }
}
