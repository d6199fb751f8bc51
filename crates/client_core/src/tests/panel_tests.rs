use super::*;
use std::sync::Mutex;

use axum::{
    extract::{RawQuery, State},
    http::{Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::domain::PulseSpec;
use tokio::net::TcpListener;

use crate::test_support::{report, Entry, FakeActuator, Journal, RecordingSink};

fn scenario_pulses() -> PulseDurations {
    PulseDurations {
        short: PulseSpec::new(1.5).expect("short"),
        long: PulseSpec::new(8.0).expect("long"),
    }
}

fn panel_with(actuator: FakeActuator, journal: &Journal) -> Panel {
    Panel::start(
        Arc::new(actuator),
        scenario_pulses(),
        Arc::new(RecordingSink::new(journal.clone())),
    )
}

#[tokio::test]
async fn power_button_gesture_is_one_press_and_one_release() {
    let journal = Journal::default();
    let mut panel = panel_with(FakeActuator::new(journal.clone()), &journal);

    panel.pointer(Control::PowerButton, InputSource::Mouse, PointerEvent::Down);
    assert!(panel.is_pressed(Control::PowerButton));
    panel.pointer(Control::PowerButton, InputSource::Mouse, PointerEvent::Up);
    assert!(!panel.is_pressed(Control::PowerButton));
    panel.shutdown().await;

    assert_eq!(
        journal.commands(),
        vec![Entry::Call("press"), Entry::Call("release")]
    );
    assert_eq!(
        journal.marker_entries(Control::PowerButton),
        vec![
            Entry::Marker(Control::PowerButton, true),
            Entry::Marker(Control::PowerButton, false),
        ]
    );
}

#[tokio::test]
async fn pulse_buttons_run_their_configured_durations() {
    let journal = Journal::default();
    let mut panel = panel_with(FakeActuator::new(journal.clone()), &journal);

    panel.pointer(Control::ShortPulse, InputSource::Touch, PointerEvent::Down);
    panel.pointer(Control::ShortPulse, InputSource::Touch, PointerEvent::Up);
    journal
        .wait_for(Entry::Marker(Control::ShortPulse, false))
        .await;

    panel.pointer(Control::LongPulse, InputSource::Mouse, PointerEvent::Down);
    panel.pointer(Control::LongPulse, InputSource::Mouse, PointerEvent::Up);
    journal
        .wait_for(Entry::Marker(Control::LongPulse, false))
        .await;
    panel.shutdown().await;

    assert_eq!(
        journal.commands(),
        vec![
            Entry::Call("release"),
            Entry::TimedCall(1.5),
            Entry::Call("release"),
            Entry::TimedCall(8.0),
        ]
    );
}

#[tokio::test]
async fn poll_results_reach_the_sink_and_subscribers() {
    let journal = Journal::default();
    let actuator = FakeActuator::new(journal.clone());
    actuator.script_status(Ok(report(true)));
    let panel = panel_with(actuator, &journal);
    let mut rx = panel.subscribe();

    rx.changed().await.expect("poller alive");
    assert_eq!(*rx.borrow(), PowerState::On);
    assert_eq!(panel.power_state(), PowerState::On);
    assert!(panel.latest_report().is_some());
    panel.shutdown().await;

    assert_eq!(
        journal.power_entries().first(),
        Some(&Entry::Power(PowerState::On))
    );
}

#[derive(Clone, Default)]
struct WireLog(Arc<Mutex<Vec<String>>>);

impl WireLog {
    fn commands(&self) -> Vec<String> {
        self.0
            .lock()
            .expect("wire log")
            .iter()
            .filter(|line| !line.starts_with("GET /status"))
            .cloned()
            .collect()
    }

    async fn wait_for_commands(&self, count: usize) {
        for _ in 0..1000 {
            if self.commands().len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        panic!("actuator only saw {:?}", self.commands());
    }
}

async fn record_command(
    State(log): State<WireLog>,
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> StatusCode {
    let line = match query {
        Some(query) => format!("{method} {}?{query}", uri.path()),
        None => format!("{method} {}", uri.path()),
    };
    log.0.lock().expect("wire log").push(line);
    StatusCode::OK
}

async fn report_on(State(log): State<WireLog>) -> Json<serde_json::Value> {
    log.0.lock().expect("wire log").push("GET /status".to_string());
    Json(json!({ "on": true, "pressed": false }))
}

#[tokio::test]
async fn gestures_reach_a_real_http_actuator_in_order() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let log = WireLog::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/press", post(record_command))
        .route("/release", post(record_command))
        .route("/status", get(report_on))
        .with_state(log.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let journal = Journal::default();
    let settings = Settings {
        actuator_url: format!("http://{addr}"),
        short_pulse_seconds: 1.5,
        long_pulse_seconds: 8.0,
    };
    let mut panel = Panel::connect(&settings, Arc::new(RecordingSink::new(journal.clone())))
        .expect("panel");

    panel.pointer(Control::PowerButton, InputSource::Touch, PointerEvent::Down);
    panel.pointer(Control::PowerButton, InputSource::Touch, PointerEvent::Up);
    // Emulated mouse events right after the touch must not reach the wire.
    panel.pointer(Control::PowerButton, InputSource::Mouse, PointerEvent::Down);
    panel.pointer(Control::PowerButton, InputSource::Mouse, PointerEvent::Up);
    log.wait_for_commands(2).await;
    panel.pointer(Control::ShortPulse, InputSource::Mouse, PointerEvent::Down);
    journal
        .wait_for(Entry::Marker(Control::ShortPulse, false))
        .await;
    journal.wait_for(Entry::Power(PowerState::On)).await;
    panel.shutdown().await;

    let commands = log.commands();
    assert_eq!(
        commands,
        vec![
            "POST /press".to_string(),
            "POST /release".to_string(),
            "POST /release".to_string(),
            "POST /press?t=1.5&wait".to_string(),
        ]
    );
}

#[tokio::test]
async fn connect_rejects_invalid_settings() {
    let settings = Settings {
        short_pulse_seconds: -1.0,
        ..Settings::default()
    };
    let result = Panel::connect(&settings, Arc::new(crate::markers::NoopSink));
    assert!(matches!(result, Err(SettingsError::InvalidPulse { .. })));
}
