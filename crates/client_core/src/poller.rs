//! Status poller: the only writer of the cached power state.
//!
//! Ticks fire every [`POLL_INTERVAL`] whether or not the previous round trip
//! finished. Each tick takes a sequence number when it starts, and a
//! completed response is only applied if no newer tick has been applied
//! already. A failed poll changes nothing. At most [`MAX_PENDING_POLLS`]
//! round trips are outstanding at once; ticks beyond that are skipped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::PowerState,
    protocol::{StatusReport, POLL_INTERVAL},
};
use tokio::{
    sync::{oneshot, watch},
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::{debug, info};

use crate::{delivery::Delivery, error::ActuatorError, markers::FeedbackSink, transport::Actuator};

/// Poll round trips allowed in flight before further ticks are skipped.
pub const MAX_PENDING_POLLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Changed(PowerState),
    Unchanged(PowerState),
    /// A newer tick had already been applied; this response was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct Ledger {
    issued: u64,
    applied: u64,
    latest: Option<StatusReport>,
}

pub struct StatusPoller {
    actuator: Arc<dyn Actuator>,
    sink: Arc<dyn FeedbackSink>,
    state_tx: watch::Sender<PowerState>,
    ledger: Mutex<Ledger>,
}

impl StatusPoller {
    pub fn new(actuator: Arc<dyn Actuator>, sink: Arc<dyn FeedbackSink>) -> Self {
        let (state_tx, _) = watch::channel(PowerState::Off);
        Self {
            actuator,
            sink,
            state_tx,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn power_state(&self) -> PowerState {
        *self.state_tx.borrow()
    }

    /// Receiver that wakes on every power state change.
    pub fn subscribe(&self) -> watch::Receiver<PowerState> {
        self.state_tx.subscribe()
    }

    pub fn latest_report(&self) -> Option<StatusReport> {
        self.ledger().latest.clone()
    }

    /// Run one poll tick to completion.
    pub async fn tick(&self) -> Delivery<PollOutcome> {
        let seq = self.begin_tick();
        let result = self.actuator.status().await;
        self.complete_tick(seq, result)
    }

    pub(crate) fn begin_tick(&self) -> u64 {
        let mut ledger = self.ledger();
        ledger.issued += 1;
        ledger.issued
    }

    pub(crate) fn complete_tick(
        &self,
        seq: u64,
        result: Result<StatusReport, ActuatorError>,
    ) -> Delivery<PollOutcome> {
        let report = match Delivery::absorb(result) {
            Delivery::Delivered(report) => report,
            Delivery::Absorbed(err) => return Delivery::Absorbed(err),
        };

        let mut ledger = self.ledger();
        if seq <= ledger.applied {
            debug!(seq, applied = ledger.applied, "stale status response dropped");
            return Delivery::Delivered(PollOutcome::Stale);
        }
        ledger.applied = seq;

        let observed = report.power_state();
        ledger.latest = Some(report);

        let changed = self.state_tx.send_if_modified(|cached| {
            if *cached == observed {
                false
            } else {
                *cached = observed;
                true
            }
        });

        // Notify under the ledger lock so concurrent completions reach the
        // sink in the order they were applied.
        if changed {
            info!(state = %observed, "actuator power state changed");
            self.sink.power_changed(observed);
            Delivery::Delivered(PollOutcome::Changed(observed))
        } else {
            debug!(seq, state = %observed, "status unchanged");
            Delivery::Delivered(PollOutcome::Unchanged(observed))
        }
    }

    /// Start the poll loop on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> PollerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let poller = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(POLL_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if in_flight.len() >= MAX_PENDING_POLLS {
                            debug!(
                                pending = in_flight.len(),
                                "status polls still pending; tick skipped"
                            );
                            continue;
                        }
                        let seq = poller.begin_tick();
                        let poller = Arc::clone(&poller);
                        in_flight.spawn(async move {
                            let result = poller.actuator.status().await;
                            let _ = poller.complete_tick(seq, result);
                        });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }

            in_flight.abort_all();
            debug!("status poller stopped");
        });

        PollerHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

pub struct PollerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = self.task.await;
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
