use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Account region. The code is sent verbatim as `RegionCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Usa,
    Europe,
    Canada,
    Australia,
    Japan,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown region: {0}")]
pub struct UnknownRegion(pub String);

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Usa,
        Region::Europe,
        Region::Canada,
        Region::Australia,
        Region::Japan,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Region::Usa => "NNA",
            Region::Europe => "NE",
            Region::Canada => "NCI",
            Region::Australia => "NMA",
            Region::Japan => "NML",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Region::Usa => "usa",
            Region::Europe => "europe",
            Region::Canada => "canada",
            Region::Australia => "australia",
            Region::Japan => "japan",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Region::ALL
            .into_iter()
            .find(|region| {
                region.code().eq_ignore_ascii_case(trimmed)
                    || region.name().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownRegion(trimmed.to_string()))
    }
}
