//! Actuator round trips over HTTP.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::PulseSpec,
    error::ApiError,
    protocol::{ActuatorCommand, HoldAccepted, HttpMethod, PressRecord, StatusReport},
};
use tracing::debug;
use url::Url;

use crate::error::ActuatorError;

/// The remote device driving the physical button.
///
/// Bodies of the three POST commands are optional: an actuator that answers
/// with an empty body still counts as a success.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn press(&self) -> Result<Option<HoldAccepted>, ActuatorError>;
    async fn release(&self) -> Result<Option<PressRecord>, ActuatorError>;
    /// Resolves only after the actuator finished the timed press.
    async fn timed_press(&self, pulse: PulseSpec) -> Result<Option<PressRecord>, ActuatorError>;
    async fn status(&self) -> Result<StatusReport, ActuatorError>;
}

/// Parse an actuator base address so command paths can be joined onto it.
pub fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(raw.trim())?;
    if base.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

pub struct HttpActuator {
    http: Client,
    base: Url,
}

impl HttpActuator {
    pub fn new(base: Url) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    fn endpoint(&self, command: &ActuatorCommand) -> Result<Url, ActuatorError> {
        self.base
            .join(&command.path_and_query())
            .map_err(|err| ActuatorError::Url {
                command: command.name(),
                reason: err.to_string(),
            })
    }

    /// Perform one round trip and hand back the raw body of a success answer.
    async fn send(&self, command: ActuatorCommand) -> Result<Vec<u8>, ActuatorError> {
        let name = command.name();
        let url = self.endpoint(&command)?;
        let request = match command.method() {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        let response = request
            .send()
            .await
            .map_err(|err| ActuatorError::Transport {
                command: name,
                reason: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ActuatorError::Transport {
                command: name,
                reason: err.to_string(),
            })?;

        // Status polls only trust an explicit 200.
        let accepted = match command {
            ActuatorCommand::Status => status == StatusCode::OK,
            _ => status.is_success(),
        };
        if !accepted {
            return Err(ActuatorError::Status {
                command: name,
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        debug!(command = name, status = status.as_u16(), "actuator round trip done");
        Ok(body.to_vec())
    }
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(api_error) = serde_json::from_slice::<ApiError>(body) {
        return api_error.error;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no reason given")
            .to_string()
    } else {
        text.to_string()
    }
}

fn decode<T: DeserializeOwned>(command: &'static str, body: &[u8]) -> Result<T, ActuatorError> {
    serde_json::from_slice(body).map_err(|err| ActuatorError::Decode {
        command,
        reason: err.to_string(),
    })
}

fn decode_optional<T: DeserializeOwned>(
    command: &'static str,
    body: &[u8],
) -> Result<Option<T>, ActuatorError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    decode(command, body).map(Some)
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn press(&self) -> Result<Option<HoldAccepted>, ActuatorError> {
        let command = ActuatorCommand::Press;
        let body = self.send(command).await?;
        decode_optional(command.name(), &body)
    }

    async fn release(&self) -> Result<Option<PressRecord>, ActuatorError> {
        let command = ActuatorCommand::Release;
        let body = self.send(command).await?;
        decode_optional(command.name(), &body)
    }

    async fn timed_press(&self, pulse: PulseSpec) -> Result<Option<PressRecord>, ActuatorError> {
        let command = ActuatorCommand::TimedPress {
            seconds: pulse.duration_seconds(),
        };
        let body = self.send(command).await?;
        decode_optional(command.name(), &body)
    }

    async fn status(&self) -> Result<StatusReport, ActuatorError> {
        let command = ActuatorCommand::Status;
        let body = self.send(command).await?;
        decode(command.name(), &body)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
