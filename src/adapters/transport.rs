use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

pub const BASE_URL: &str = "https://gdcportalgw.its-mo.com/gworchest_160803A/gdc/";

const USER_AGENT: &str = concat!("carwings/", env!("CARGO_PKG_VERSION"));
const STATUS_OK: i64 = 200;

pub type FormParams = [(&'static str, String)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    InitialApp,
    UserLogin,
    BatteryStatusCheck,
    BatteryStatusCheckResult,
    BatteryStatusRecords,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::InitialApp => "InitialApp.php",
            Endpoint::UserLogin => "UserLoginRequest.php",
            Endpoint::BatteryStatusCheck => "BatteryStatusCheckRequest.php",
            Endpoint::BatteryStatusCheckResult => "BatteryStatusCheckResultRequest.php",
            Endpoint::BatteryStatusRecords => "BatteryStatusRecordsRequest.php",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Posts one form-encoded request and returns the decoded JSON body once its embedded
/// status has been checked.
pub trait CarwingsTransport: Send + Sync {
    fn post_form(&self, endpoint: Endpoint, params: &FormParams) -> Result<Value, TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transport i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("{endpoint} response carries no status code")]
    MissingStatus { endpoint: &'static str },
    #[error("{endpoint} returned status code {status}")]
    ProtocolStatus { endpoint: &'static str, status: i64 },
}

/// The service reports failures in a `status` field of an otherwise normal HTTP 200 reply.
pub(crate) fn check_status(endpoint: Endpoint, body: &Value) -> Result<(), TransportError> {
    let status = body
        .get("status")
        .and_then(|value| match value {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
        .ok_or(TransportError::MissingStatus {
            endpoint: endpoint.path(),
        })?;

    if status != STATUS_OK {
        return Err(TransportError::ProtocolStatus {
            endpoint: endpoint.path(),
            status,
        });
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    debug: bool,
}

impl HttpTransport {
    /// With `debug` set, every raw response is dumped to standard error before decoding.
    pub fn new(base_url: &str, timeout: Duration, debug: bool) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            debug,
        })
    }
}

impl CarwingsTransport for HttpTransport {
    fn post_form(&self, endpoint: Endpoint, params: &FormParams) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(endpoint = %endpoint, "sending carwings request");

        let response = self.client.post(&url).form(params).send()?;

        let body: Value = if self.debug {
            let status = response.status();
            let headers = response.headers().clone();
            let text = response.text()?;
            eprintln!("{}", format_response_dump(status, &headers, &text));
            serde_json::from_str(&text)?
        } else {
            response.json()?
        };

        check_status(endpoint, &body)?;
        Ok(body)
    }
}

fn format_response_dump(status: reqwest::StatusCode, headers: &HeaderMap, body: &str) -> String {
    let mut dump = format!("HTTP {status}\n");
    for (name, value) in headers {
        dump.push_str(&format!(
            "{name}: {}\n",
            value.to_str().unwrap_or("<non-ascii>")
        ));
    }
    dump.push('\n');
    dump.push_str(body);
    dump.push('\n');
    dump
}
