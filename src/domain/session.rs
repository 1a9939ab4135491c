use std::fmt;

use chrono_tz::Tz;

use crate::domain::region::Region;

/// An authenticated binding to one vehicle.
///
/// A session carries no interior mutability and may be shared between threads, but it should drive
/// at most one refresh cycle at a time: result keys from overlapping refresh requests against the
/// same vehicle are not safely interleaved. Status reads may run while a refresh is being polled.
#[derive(Clone, PartialEq)]
pub struct Session {
    region: Region,
    vin: String,
    custom_session_id: String,
    locale: Tz,
}

impl Session {
    pub fn new(
        region: Region,
        vin: impl Into<String>,
        custom_session_id: impl Into<String>,
        locale: Tz,
    ) -> Self {
        Self {
            region,
            vin: vin.into(),
            custom_session_id: custom_session_id.into(),
            locale,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn vin(&self) -> &str {
        &self.vin
    }

    pub fn locale(&self) -> Tz {
        self.locale
    }

    /// An empty session token means the session never logged in.
    pub fn is_authenticated(&self) -> bool {
        !self.custom_session_id.is_empty()
    }

    pub(crate) fn common_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("RegionCode", self.region.code().to_string()),
            ("VIN", self.vin.clone()),
            ("custom_sessionid", self.custom_session_id.clone()),
        ]
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("region", &self.region)
            .field("vin", &self.vin)
            .field("custom_session_id", &"<redacted>")
            .field("locale", &self.locale)
            .finish()
    }
}
