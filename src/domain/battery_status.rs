use std::fmt;

use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;

const MILES_PER_METER: f64 = 0.000621371;

/// Converts a cruising range reported in meters to whole miles, truncating toward zero.
pub fn meters_to_miles(meters: i64) -> i64 {
    (meters as f64 * MILES_PER_METER) as i64
}

/// Battery state as recorded by the service.
///
/// This is never a live reading: it reflects the vehicle data captured by the last completed
/// refresh cycle, stamped with `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryStatus {
    /// When the vehicle reported this data, in the session locale.
    pub timestamp: DateTime<Tz>,
    /// Total battery capacity, in the service's own units.
    pub capacity: i64,
    /// Remaining charge, same units as `capacity`.
    pub remaining: i64,
    /// Remaining charge in Wh, only reported by some models.
    pub remaining_wh: Option<i64>,
    pub state_of_charge_pct: i64,
    /// Range with climate control on, in meters.
    pub cruising_range_ac_on_m: i64,
    /// Range with climate control off, in meters.
    pub cruising_range_ac_off_m: i64,
    pub plugin_state: PluginState,
    pub charging_status: ChargingStatus,
    pub time_to_full: TimeToFull,
}

impl BatteryStatus {
    pub fn cruising_range_ac_on_miles(&self) -> i64 {
        meters_to_miles(self.cruising_range_ac_on_m)
    }

    pub fn cruising_range_ac_off_miles(&self) -> i64 {
        meters_to_miles(self.cruising_range_ac_off_m)
    }
}

/// Time to a full battery for each charging method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeToFull {
    /// 1.4 kW trickle charge (120V 12A).
    pub level1: TimeDelta,
    /// 3.3 kW level 2 charge (240V ~15A).
    pub level2: TimeDelta,
    /// 6.6 kW level 2 charge (240V ~30A).
    pub level2_at_6kw: TimeDelta,
}

/// Whether and how the vehicle is plugged in. A vehicle can be plugged in without charging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PluginState {
    NotConnected,
    /// Normal J1772 level 1 or 2 charger.
    Connected,
    /// DC quick charger (CHAdeMO).
    QcConnected,
    /// Reported when the vehicle could not be reached during the last refresh.
    Invalid,
    Unrecognized(String),
}

impl PluginState {
    pub fn from_code(code: &str) -> Self {
        match code {
            "NOT_CONNECTED" => Self::NotConnected,
            "CONNECTED" => Self::Connected,
            "QC_CONNECTED" => Self::QcConnected,
            "INVALID" => Self::Invalid,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::Connected => "CONNECTED",
            Self::QcConnected => "QC_CONNECTED",
            Self::Invalid => "INVALID",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotConnected => "not connected",
            Self::Connected => "connected",
            Self::QcConnected => "connected to quick charger",
            Self::Invalid => "invalid",
            Self::Unrecognized(raw) => raw.as_str(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChargingStatus {
    NotCharging,
    /// Level 1 or 2 EVSE.
    NormalCharging,
    /// DC quick charger.
    RapidlyCharging,
    /// Reported when the vehicle could not be reached during the last refresh.
    Invalid,
    Unrecognized(String),
}

impl ChargingStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "NOT_CHARGING" => Self::NotCharging,
            "NORMAL_CHARGING" => Self::NormalCharging,
            "RAPIDLY_CHARGING" => Self::RapidlyCharging,
            "INVALID" => Self::Invalid,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NotCharging => "NOT_CHARGING",
            Self::NormalCharging => "NORMAL_CHARGING",
            Self::RapidlyCharging => "RAPIDLY_CHARGING",
            Self::Invalid => "INVALID",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for ChargingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotCharging => "not charging",
            Self::NormalCharging => "charging",
            Self::RapidlyCharging => "rapidly charging",
            Self::Invalid => "invalid",
            Self::Unrecognized(raw) => raw.as_str(),
        })
    }
}
