use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapters::transport::{CarwingsTransport, Endpoint, TransportError};
use crate::domain::battery_status::BatteryStatus;
use crate::domain::credential_cipher;
use crate::domain::region::Region;
use crate::domain::session::Session;
use crate::domain::status_decoder::decode_battery_status;
use crate::domain::update_cycle::{
    CycleOutcome, PollPolicy, PollReply, ResultKey, Sleeper, UpdateCycle, decode_poll_reply,
};
use crate::error::{CarwingsError, LoginFailure};

/// Extracted from the NissanConnect EV app.
pub const INITIAL_APP_STRINGS: &str = "geORNtsZe5I4lRGjG9GZiA";

#[derive(Debug, Deserialize)]
struct HandshakeResponse {
    #[serde(default)]
    baseprm: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "VehicleInfoList", alias = "vehicleInfoList", default)]
    vehicle_info_list: VehicleInfoList,
    #[serde(rename = "CustomerInfo", alias = "customerInfo", default)]
    customer_info: CustomerInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VehicleInfoList {
    #[serde(rename = "vehicleInfo", alias = "VehicleInfo", default)]
    vehicle_info: Vec<VehicleInfo>,
}

#[derive(Debug, Deserialize)]
struct VehicleInfo {
    vin: String,
    custom_sessionid: String,
}

#[derive(Debug, Default, Deserialize)]
struct CustomerInfo {
    #[serde(rename = "Timezone", alias = "timezone", default)]
    timezone: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "resultKey")]
    result_key: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Client operations against the Carwings service.
///
/// Every call is a single blocking request; nothing is retried here. Polling cadence is the
/// caller's choice, either by driving [`CarwingsService::poll_once`] directly or through
/// [`CarwingsService::refresh_and_wait`] with a [`PollPolicy`].
#[derive(Debug, Clone)]
pub struct CarwingsService<T> {
    transport: T,
}

impl<T> CarwingsService<T>
where
    T: CarwingsTransport,
{
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the handshake and login, binding the session to the first vehicle on the account.
    pub fn connect(
        &self,
        username: &str,
        password: &str,
        region: Region,
    ) -> Result<Session, CarwingsError> {
        let mut params = vec![("initial_app_strings", INITIAL_APP_STRINGS.to_string())];

        let handshake: HandshakeResponse = self
            .transport
            .post_form(Endpoint::InitialApp, &params)
            .and_then(decode_body)
            .map_err(CarwingsError::HandshakeFailed)?;

        // An absent or empty key is rejected by the cipher.
        let key = handshake.baseprm.unwrap_or_default();
        let encrypted_password = credential_cipher::encrypt(password.as_bytes(), key.as_bytes())?;

        params.push(("UserId", username.to_string()));
        params.push(("Password", encrypted_password));
        params.push(("RegionCode", region.code().to_string()));

        let login: LoginResponse = self
            .transport
            .post_form(Endpoint::UserLogin, &params)
            .and_then(decode_body)
            .map_err(|error| CarwingsError::LoginFailed(LoginFailure::Call(error)))?;

        let locale = resolve_locale(&login.customer_info.timezone);
        let vehicle_count = login.vehicle_info_list.vehicle_info.len();
        let vehicle = login
            .vehicle_info_list
            .vehicle_info
            .into_iter()
            .next()
            .ok_or(CarwingsError::LoginFailed(LoginFailure::NoVehicle))?;

        tracing::info!(
            vin = %vehicle.vin,
            region = %region,
            locale = %locale,
            vehicle_count,
            "carwings session established"
        );

        Ok(Session::new(
            region,
            vehicle.vin,
            vehicle.custom_sessionid,
            locale,
        ))
    }

    /// Asks the service to fetch fresh data from the vehicle. The returned key identifies this
    /// refresh for [`CarwingsService::poll_once`].
    pub fn request_refresh(&self, session: &Session) -> Result<ResultKey, CarwingsError> {
        ensure_authenticated(session)?;

        let body = self
            .transport
            .post_form(Endpoint::BatteryStatusCheck, &session.common_params())?;
        let reply: RefreshResponse = decode_body(body)?;

        tracing::debug!(vin = %session.vin(), "vehicle refresh requested");
        Ok(ResultKey::new(reply.result_key))
    }

    /// Polls once. `Ok(true)` means the refresh finished and the status records are current.
    pub fn poll_once(
        &self,
        session: &Session,
        result_key: &ResultKey,
    ) -> Result<bool, CarwingsError> {
        ensure_authenticated(session)?;

        let mut params = session.common_params();
        params.push(("resultKey", result_key.as_str().to_string()));

        let body = self
            .transport
            .post_form(Endpoint::BatteryStatusCheckResult, &params)?;

        match decode_poll_reply(&body)? {
            PollReply::Ready => Ok(true),
            PollReply::Pending => Ok(false),
            PollReply::Abnormal => {
                tracing::warn!(vin = %session.vin(), "service could not reach the vehicle");
                Err(CarwingsError::UpdateFailed)
            }
        }
    }

    /// Requests a refresh and polls until it completes, fails, or the policy runs out of attempts.
    /// Sleeps for the policy interval before every poll. Returns the number of polls made.
    pub fn refresh_and_wait<S: Sleeper>(
        &self,
        session: &Session,
        policy: &PollPolicy,
        sleeper: &S,
    ) -> Result<u32, CarwingsError> {
        let mut cycle = UpdateCycle::new(self.request_refresh(session)?, policy);

        loop {
            sleeper.sleep(policy.interval);

            let ready = match self.poll_once(session, cycle.result_key()) {
                Ok(ready) => ready,
                Err(error) => {
                    cycle.fail();
                    tracing::warn!(phase = ?cycle.phase(), error = %error, "vehicle refresh failed");
                    return Err(error);
                }
            };

            match cycle.observe(ready) {
                Some(CycleOutcome::Completed { attempts }) => {
                    let phase = cycle.finish();
                    tracing::info!(attempts, ?phase, "vehicle refresh completed");
                    return Ok(attempts);
                }
                Some(CycleOutcome::Exhausted { attempts }) => {
                    let phase = cycle.finish();
                    tracing::warn!(attempts, ?phase, "vehicle refresh did not complete in time");
                    return Err(CarwingsError::UpdateTimedOut { attempts });
                }
                None => tracing::debug!(phase = ?cycle.phase(), "vehicle refresh pending"),
            }
        }
    }

    /// Reads the battery status recorded by the last completed refresh. This is not a live
    /// reading; run a refresh cycle first when current data matters.
    pub fn battery_status(&self, session: &Session) -> Result<BatteryStatus, CarwingsError> {
        ensure_authenticated(session)?;

        let body = self
            .transport
            .post_form(Endpoint::BatteryStatusRecords, &session.common_params())?;

        Ok(decode_battery_status(&body, session.locale())?)
    }
}

fn ensure_authenticated(session: &Session) -> Result<(), CarwingsError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(CarwingsError::NotAuthenticated)
    }
}

fn decode_body<R: DeserializeOwned>(body: Value) -> Result<R, TransportError> {
    Ok(serde_json::from_value(body)?)
}

fn resolve_locale(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(locale) => locale,
        Err(_) => {
            tracing::warn!(timezone = name, "unknown account time zone, falling back to UTC");
            Tz::UTC
        }
    }
}
