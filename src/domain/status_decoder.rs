use chrono::{NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::domain::battery_status::{BatteryStatus, ChargingStatus, PluginState, TimeToFull};
use crate::domain::wire::{
    DecodeError, as_object, find_value, optional_i64, require_i64, require_object, require_str,
};

/// Wire layout of `NotificationDateAndTime`, always UTC.
const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M";

const LEVEL1_KEY: &str = "TimeRequiredToFull";
const LEVEL2_KEY: &str = "TimeRequiredToFull200";
const LEVEL2_6KW_KEY: &str = "TimeRequiredToFull200_6kW";

/// Parses a service timestamp such as `2023/01/05 14:07`.
///
/// Accepts the bare text or the raw JSON token, which arrives quoted with escaped slashes
/// (`"2023\/01\/05 14:07"`).
pub fn parse_timestamp(raw: &[u8]) -> Result<NaiveDateTime, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidTimestamp {
        value: String::from_utf8_lossy(raw).into_owned(),
        reason,
    };

    let text = std::str::from_utf8(raw).map_err(|err| invalid(err.to_string()))?;
    let trimmed = text.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(trimmed);
    let unescaped = unquoted.replace("\\/", "/");

    NaiveDateTime::parse_from_str(&unescaped, TIMESTAMP_FORMAT).map_err(|err| invalid(err.to_string()))
}

/// Decodes a `BatteryStatusRecordsRequest` reply into a [`BatteryStatus`] in the given locale.
pub fn decode_battery_status(payload: &Value, locale: Tz) -> Result<BatteryStatus, DecodeError> {
    let root = payload.as_object().ok_or(DecodeError::InvalidPayloadType)?;
    let records = require_object(root, "BatteryStatusRecords")?;
    let battery = require_object(records, "BatteryStatus")?;
    let soc = require_object(battery, "SOC")?;

    let notified_at = parse_timestamp(require_str(records, "NotificationDateAndTime")?.as_bytes())?;

    Ok(BatteryStatus {
        timestamp: notified_at.and_utc().with_timezone(&locale),
        capacity: require_i64(battery, "BatteryCapacity")?,
        remaining: require_i64(battery, "BatteryRemainingAmount")?,
        remaining_wh: optional_i64(battery, "BatteryRemainingAmountWH")?,
        state_of_charge_pct: require_i64(soc, "Value")?,
        cruising_range_ac_on_m: require_i64(records, "CruisingRangeAcOn")?,
        cruising_range_ac_off_m: require_i64(records, "CruisingRangeAcOff")?,
        plugin_state: PluginState::from_code(require_str(records, "PluginState")?),
        charging_status: ChargingStatus::from_code(require_str(
            battery,
            "BatteryChargingStatus",
        )?),
        time_to_full: TimeToFull {
            level1: charge_time(records, LEVEL1_KEY)?,
            level2: charge_time(records, LEVEL2_KEY)?,
            level2_at_6kw: charge_time(records, LEVEL2_6KW_KEY)?,
        },
    })
}

/// Vehicles omit buckets for charging methods they do not support; those read as zero.
fn charge_time(records: &Map<String, Value>, key: &'static str) -> Result<TimeDelta, DecodeError> {
    let Some(bucket) = find_value(records, key) else {
        return Ok(TimeDelta::zero());
    };
    let bucket = as_object(bucket, key)?;

    let hours = require_i64(bucket, "HourRequiredToFull")?;
    let minutes = require_i64(bucket, "MinutesRequiredToFull")?;

    hours
        .checked_mul(60)
        .and_then(|total| total.checked_add(minutes))
        .and_then(TimeDelta::try_minutes)
        .ok_or(DecodeError::DurationOutOfRange(key))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, TimeDelta, Timelike};
    use chrono_tz::Tz;
    use serde_json::json;

    use super::{decode_battery_status, parse_timestamp};
    use crate::domain::battery_status::{ChargingStatus, PluginState};
    use crate::domain::wire::DecodeError;
    use crate::test_support::battery_records_payload;

    #[test]
    fn parses_timestamp_components_literally() {
        let parsed = parse_timestamp(b"2023/01/05 14:07").expect("timestamp should parse");

        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2023, 1, 5)
                .and_then(|date| date.and_hms_opt(14, 7, 0))
                .expect("valid date")
        );
    }

    #[test]
    fn parses_raw_json_token_with_escaped_separators() {
        let parsed = parse_timestamp(br#""2023\/01\/05 14:07""#).expect("timestamp should parse");

        assert_eq!(parsed.year(), 2023);
        assert_eq!(parsed.month(), 1);
        assert_eq!(parsed.day(), 5);
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.minute(), 7);
    }

    #[test]
    fn rejects_other_timestamp_layouts() {
        let cases: [&[u8]; 5] = [
            b"2023-01-05 14:07",
            b"Jan 05, 2023 02:07 PM",
            b"2023/13/05 14:07",
            b"",
            b"\xff\xfe",
        ];
        for raw in cases {
            assert!(
                matches!(
                    parse_timestamp(raw),
                    Err(DecodeError::InvalidTimestamp { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn decodes_full_status_record() {
        let status = decode_battery_status(&battery_records_payload(), Tz::UTC)
            .expect("status should decode");

        assert_eq!(status.capacity, 240);
        assert_eq!(status.remaining, 180);
        assert_eq!(status.remaining_wh, Some(18_000));
        assert_eq!(status.state_of_charge_pct, 75);
        assert_eq!(status.cruising_range_ac_on_m, 107_000);
        assert_eq!(status.cruising_range_ac_off_m, 115_000);
        assert_eq!(status.plugin_state, PluginState::Connected);
        assert_eq!(status.charging_status, ChargingStatus::NormalCharging);
        assert_eq!(status.time_to_full.level1, TimeDelta::minutes(150));
        assert_eq!(status.time_to_full.level2, TimeDelta::minutes(95));
        assert_eq!(status.time_to_full.level2_at_6kw, TimeDelta::minutes(60));
        assert_eq!(status.timestamp.to_rfc3339(), "2023-01-05T14:07:00+00:00");
    }

    #[test]
    fn renders_timestamp_in_session_locale() {
        let status = decode_battery_status(&battery_records_payload(), Tz::America__Los_Angeles)
            .expect("status should decode");

        assert_eq!(status.timestamp.timezone(), Tz::America__Los_Angeles);
        assert_eq!(status.timestamp.to_rfc3339(), "2023-01-05T06:07:00-08:00");
        assert_eq!(status.timestamp.naive_utc().hour(), 14);
    }

    #[test]
    fn composes_durations_without_validating_minutes() {
        let mut payload = battery_records_payload();
        payload["BatteryStatusRecords"]["TimeRequiredToFull"] =
            json!({"HourRequiredToFull": "1", "MinutesRequiredToFull": "75"});

        let status = decode_battery_status(&payload, Tz::UTC).expect("status should decode");

        assert_eq!(status.time_to_full.level1, TimeDelta::minutes(135));
    }

    #[test]
    fn missing_charge_time_buckets_are_zero() {
        let mut payload = battery_records_payload();
        let records = payload["BatteryStatusRecords"]
            .as_object_mut()
            .expect("records object expected");
        records.remove("TimeRequiredToFull200");
        records.remove("TimeRequiredToFull200_6kW");

        let status = decode_battery_status(&payload, Tz::UTC).expect("status should decode");

        assert_eq!(status.time_to_full.level1, TimeDelta::minutes(150));
        assert_eq!(status.time_to_full.level2, TimeDelta::zero());
        assert_eq!(status.time_to_full.level2_at_6kw, TimeDelta::zero());
    }

    #[test]
    fn keeps_unrecognized_state_codes() {
        let mut payload = battery_records_payload();
        payload["BatteryStatusRecords"]["PluginState"] = json!("WIRELESS");
        payload["BatteryStatusRecords"]["BatteryStatus"]["BatteryChargingStatus"] =
            json!("YES");

        let status = decode_battery_status(&payload, Tz::UTC).expect("status should decode");

        assert_eq!(
            status.plugin_state,
            PluginState::Unrecognized("WIRELESS".to_string())
        );
        assert_eq!(status.charging_status.to_string(), "YES");
    }

    #[test]
    fn decodes_invalid_states_after_failed_refresh() {
        let mut payload = battery_records_payload();
        payload["BatteryStatusRecords"]["PluginState"] = json!("INVALID");
        payload["BatteryStatusRecords"]["BatteryStatus"]["BatteryChargingStatus"] =
            json!("INVALID");

        let status = decode_battery_status(&payload, Tz::UTC).expect("status should decode");

        assert_eq!(status.plugin_state, PluginState::Invalid);
        assert_eq!(status.charging_status, ChargingStatus::Invalid);
    }

    #[test]
    fn malformed_number_is_a_decode_error() {
        let mut payload = battery_records_payload();
        payload["BatteryStatusRecords"]["CruisingRangeAcOn"] = json!("far");

        let result = decode_battery_status(&payload, Tz::UTC);

        assert_eq!(
            result,
            Err(DecodeError::InvalidNumber {
                field: "CruisingRangeAcOn",
                value: "\"far\"".to_string(),
            })
        );
    }

    #[test]
    fn malformed_timestamp_is_a_decode_error() {
        let mut payload = battery_records_payload();
        payload["BatteryStatusRecords"]["NotificationDateAndTime"] = json!("yesterday");

        let result = decode_battery_status(&payload, Tz::UTC);

        assert!(matches!(result, Err(DecodeError::InvalidTimestamp { .. })));
    }

    #[test]
    fn missing_records_object_is_reported() {
        let result = decode_battery_status(&json!({"status": 200}), Tz::UTC);

        assert_eq!(
            result,
            Err(DecodeError::MissingField("BatteryStatusRecords"))
        );
    }

    #[test]
    fn rejects_non_object_payload() {
        let result = decode_battery_status(&json!([1, 2, 3]), Tz::UTC);

        assert_eq!(result, Err(DecodeError::InvalidPayloadType));
    }
}
