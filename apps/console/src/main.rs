use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{load_settings, FeedbackSink, Panel, Settings};
use shared::domain::{Control, PowerState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{parse_line, ConsoleCommand, HELP};

/// Operate a remote power button from the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML settings file (defaults to rpb.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Actuator base address, e.g. http://10.0.0.2:5000
    #[arg(long)]
    actuator_url: Option<String>,
    /// Seconds held by the short pulse button.
    #[arg(long)]
    short_pulse: Option<f64>,
    /// Seconds held by the long pulse button.
    #[arg(long)]
    long_pulse: Option<f64>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.actuator_url {
            settings.actuator_url = v.clone();
        }
        if let Some(v) = self.short_pulse {
            settings.short_pulse_seconds = v;
        }
        if let Some(v) = self.long_pulse {
            settings.long_pulse_seconds = v;
        }
    }
}

/// Renders markers and power state as terminal lines.
struct ConsoleSink;

impl FeedbackSink for ConsoleSink {
    fn marker_changed(&self, control: Control, pressed: bool) {
        let mark = if pressed { "pressed" } else { "released" };
        println!("[{control}] {mark}");
    }

    fn power_changed(&self, state: PowerState) {
        println!("[power] {state}");
    }
}

fn print_status(panel: &Panel) {
    let pressed: Vec<String> = Control::ALL
        .into_iter()
        .filter(|control| panel.is_pressed(*control))
        .map(|control| control.to_string())
        .collect();
    if !pressed.is_empty() {
        println!("pressed: {}", pressed.join(", "));
    }
    let Some(report) = panel.latest_report() else {
        println!("no status received yet (showing {})", panel.power_state());
        return;
    };
    println!(
        "power {} | button {}",
        report.power_state(),
        if report.pressed { "held" } else { "idle" }
    );
    if let Some(since) = report.running_since {
        println!("actuator up since {since}");
    }
    if let Some(last) = report.last_press {
        println!(
            "last press at {} for {:.3}s ({} -> {})",
            last.pressed_at,
            last.elapsed,
            PowerState::from(last.start_state),
            PowerState::from(last.end_state)
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    args.apply(&mut settings);
    settings.validate().context("invalid settings")?;

    let mut panel =
        Panel::connect(&settings, Arc::new(ConsoleSink)).context("failed to start panel")?;
    let pulses = panel.pulses();
    println!(
        "connected to {} (short {}s, long {}s)",
        settings.actuator_url,
        pulses.short.duration_seconds(),
        pulses.long.duration_seconds()
    );
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
                    Ok(Some(ConsoleCommand::Status)) => print_status(&panel),
                    Ok(Some(ConsoleCommand::Pointer { control, source, events })) => {
                        for event in events {
                            panel.pointer(control, source, event);
                        }
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
    }

    panel.shutdown().await;
    Ok(())
}
