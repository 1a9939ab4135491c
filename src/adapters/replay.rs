use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::Value;

use crate::adapters::transport::{
    CarwingsTransport, Endpoint, FormParams, TransportError, check_status,
};

#[derive(Debug, Clone, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    loop_forever: bool,
    responses: HashMap<String, Vec<ScriptEvent>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScriptEvent {
    ok: Option<Value>,
    error: Option<String>,
}

/// Serves scripted replies per endpoint instead of talking to the service.
#[derive(Debug)]
pub struct ReplayTransport {
    script: ReplayScript,
    cursors: Mutex<HashMap<String, usize>>,
}

impl ReplayTransport {
    pub fn from_file(path: &str) -> Result<Self, TransportError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, TransportError> {
        let script: ReplayScript = serde_json::from_str(content)?;

        if script.responses.values().all(Vec::is_empty) {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "replay script must contain at least one response",
            )));
        }

        Ok(Self {
            script,
            cursors: Mutex::new(HashMap::new()),
        })
    }

    fn next_event(&self, endpoint: Endpoint) -> Result<ScriptEvent, TransportError> {
        let events = self
            .script
            .responses
            .get(endpoint.path())
            .filter(|events| !events.is_empty())
            .ok_or_else(|| {
                TransportError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("replay script has no response for {endpoint}"),
                ))
            })?;

        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| TransportError::Io(io::Error::other("replay cursor lock poisoned")))?;
        let cursor = cursors.entry(endpoint.path().to_string()).or_insert(0);

        if *cursor >= events.len() {
            if self.script.loop_forever {
                *cursor = 0;
            } else {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("replay finished for {endpoint}"),
                )));
            }
        }

        let event = events[*cursor].clone();
        *cursor += 1;

        Ok(event)
    }

    fn execute_event(endpoint: Endpoint, event: ScriptEvent) -> Result<Value, TransportError> {
        match (event.ok, event.error) {
            (Some(body), None) => {
                check_status(endpoint, &body)?;
                Ok(body)
            }
            (None, Some(error)) => Err(map_script_error(&error)),
            _ => Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "script event must contain exactly one of: ok or error",
            ))),
        }
    }
}

fn map_script_error(kind: &str) -> TransportError {
    let normalized = kind.trim().to_ascii_lowercase();
    let io_error = |error_kind: io::ErrorKind| TransportError::Io(io::Error::new(error_kind, kind));

    match normalized.as_str() {
        "timeout" => io_error(io::ErrorKind::TimedOut),
        "network_unreachable" | "internet_down" => io_error(io::ErrorKind::NetworkUnreachable),
        "host_unreachable" => io_error(io::ErrorKind::HostUnreachable),
        "connection_refused" => io_error(io::ErrorKind::ConnectionRefused),
        "connection_reset" => io_error(io::ErrorKind::ConnectionReset),
        "invalid_json" => match serde_json::from_str::<Value>("not json") {
            Err(parse_err) => TransportError::Json(parse_err),
            Ok(_) => io_error(io::ErrorKind::InvalidData),
        },
        _ => TransportError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unknown scripted error kind: {kind}"),
        )),
    }
}

impl CarwingsTransport for ReplayTransport {
    fn post_form(&self, endpoint: Endpoint, _params: &FormParams) -> Result<Value, TransportError> {
        tracing::debug!(endpoint = %endpoint, "replaying scripted response");
        Self::execute_event(endpoint, self.next_event(endpoint)?)
    }
}
