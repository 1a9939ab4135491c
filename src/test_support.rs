use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};

use crate::adapters::transport::{
    CarwingsTransport, Endpoint, FormParams, TransportError, check_status,
};
use crate::domain::update_cycle::Sleeper;

pub type RecordedCall = (Endpoint, Vec<(&'static str, String)>);

/// In-memory transport serving queued replies per endpoint and recording every request.
#[derive(Default)]
pub struct RecordingTransport {
    replies: Mutex<HashMap<Endpoint, VecDeque<Result<Value, TransportError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, endpoint: Endpoint, body: Value) -> Self {
        self.push(endpoint, Ok(body))
    }

    pub fn with_error(self, endpoint: Endpoint, error: TransportError) -> Self {
        self.push(endpoint, Err(error))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock should be available").clone()
    }

    fn push(self, endpoint: Endpoint, reply: Result<Value, TransportError>) -> Self {
        self.replies
            .lock()
            .expect("replies lock should be available")
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }
}

impl CarwingsTransport for RecordingTransport {
    fn post_form(&self, endpoint: Endpoint, params: &FormParams) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("calls lock should be available")
            .push((endpoint, params.to_vec()));

        let reply = self
            .replies
            .lock()
            .expect("replies lock should be available")
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no reply queued for {endpoint}"),
                )))
            })?;

        check_status(endpoint, &reply)?;
        Ok(reply)
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub fn fixture(path: &str) -> String {
    format!(
        "{}/testdata/replay/{path}",
        env!("CARGO_MANIFEST_DIR").replace('\\', "/")
    )
}

pub fn battery_records_payload() -> Value {
    json!({
        "status": 200,
        "message": "success",
        "BatteryStatusRecords": {
            "OperationResult": "START",
            "OperationDateAndTime": "Jan 05, 2023 02:07 PM",
            "BatteryStatus": {
                "BatteryChargingStatus": "NORMAL_CHARGING",
                "BatteryCapacity": "240",
                "BatteryRemainingAmount": "180",
                "BatteryRemainingAmountWH": "18000",
                "BatteryRemainingAmountkWH": "",
                "SOC": {"Value": "75"}
            },
            "PluginState": "CONNECTED",
            "CruisingRangeAcOn": "107000",
            "CruisingRangeAcOff": "115000",
            "TimeRequiredToFull": {"HourRequiredToFull": "2", "MinutesRequiredToFull": "30"},
            "TimeRequiredToFull200": {"HourRequiredToFull": "1", "MinutesRequiredToFull": "35"},
            "TimeRequiredToFull200_6kW": {"HourRequiredToFull": "1", "MinutesRequiredToFull": "0"},
            "NotificationDateAndTime": "2023/01/05 14:07",
            "TargetDate": "2023/01/05 14:07"
        }
    })
}
