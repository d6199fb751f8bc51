//! Settings: defaults, then an optional TOML file, then environment.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::{domain::PulseSpec, error::DomainError};
use thiserror::Error;
use url::Url;

use crate::{dispatcher::PulseDurations, transport::parse_base_url};

pub const DEFAULT_CONFIG_FILE: &str = "rpb.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub actuator_url: String,
    pub short_pulse_seconds: f64,
    pub long_pulse_seconds: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            actuator_url: "http://127.0.0.1:5000".into(),
            short_pulse_seconds: 1.5,
            long_pulse_seconds: 10.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    actuator_url: Option<String>,
    short_pulse_seconds: Option<f64>,
    long_pulse_seconds: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{key}: '{value}' is not a number")]
    NotANumber { key: &'static str, value: String },
    #[error("invalid actuator url '{url}': {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("{key}: {source}")]
    InvalidPulse {
        key: &'static str,
        source: DomainError,
    },
}

impl Settings {
    pub fn actuator_base(&self) -> Result<Url, SettingsError> {
        parse_base_url(&self.actuator_url).map_err(|source| SettingsError::InvalidUrl {
            url: self.actuator_url.clone(),
            source,
        })
    }

    pub fn pulse_durations(&self) -> Result<PulseDurations, SettingsError> {
        let short = PulseSpec::new(self.short_pulse_seconds).map_err(|source| {
            SettingsError::InvalidPulse {
                key: "short_pulse_seconds",
                source,
            }
        })?;
        let long = PulseSpec::new(self.long_pulse_seconds).map_err(|source| {
            SettingsError::InvalidPulse {
                key: "long_pulse_seconds",
                source,
            }
        })?;
        Ok(PulseDurations { short, long })
    }

    /// Check every field that would otherwise only fail at first use.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.actuator_base()?;
        self.pulse_durations()?;
        Ok(())
    }

    fn apply_file(&mut self, path: &Path, raw: &str) -> Result<(), SettingsError> {
        let file: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(v) = file.actuator_url {
            self.actuator_url = v;
        }
        if let Some(v) = file.short_pulse_seconds {
            self.short_pulse_seconds = v;
        }
        if let Some(v) = file.long_pulse_seconds {
            self.long_pulse_seconds = v;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), SettingsError> {
        if let Some(v) = lookup("RPB_ACTUATOR_URL") {
            self.actuator_url = v;
        }
        if let Some(v) = lookup("RPB_SHORT_PULSE_SECONDS") {
            self.short_pulse_seconds = parse_seconds("RPB_SHORT_PULSE_SECONDS", &v)?;
        }
        if let Some(v) = lookup("RPB_LONG_PULSE_SECONDS") {
            self.long_pulse_seconds = parse_seconds("RPB_LONG_PULSE_SECONDS", &v)?;
        }
        Ok(())
    }
}

fn parse_seconds(key: &'static str, value: &str) -> Result<f64, SettingsError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| SettingsError::NotANumber {
            key,
            value: value.to_string(),
        })
}

/// Load settings from the process environment.
///
/// An explicitly named file must exist. Without one, `RPB_CONFIG` or
/// [`DEFAULT_CONFIG_FILE`] is read if present and skipped otherwise.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    load_settings_with(explicit, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match lookup("RPB_CONFIG") {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        },
    };

    match fs::read_to_string(&path) {
        Ok(raw) => settings.apply_file(&path, &raw)?,
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(SettingsError::Read { path, source }),
    }

    settings.apply_env(lookup)?;
    Ok(settings)
}
