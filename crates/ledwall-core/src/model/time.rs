use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

// ── TimeOfDay ────────────────────────────────────────────────────────

/// Wall-clock time with minute resolution. Displays as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::InvalidTime {
                value: format!("{hour}:{minute:02}"),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Truncate any `chrono` time to the minute.
    pub fn from_time(time: &impl Timelike) -> Self {
        // chrono guarantees hour < 24 and minute < 60
        Self {
            hour: u8::try_from(time.hour()).unwrap_or(0),
            minute: u8::try_from(time.minute()).unwrap_or(0),
        }
    }

    /// The current local wall-clock time.
    pub fn now() -> Self {
        Self::from_time(&chrono::Local::now())
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    /// Accepts `H:MM` and `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidTime {
            value: s.to_owned(),
        };
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let well_formed = matches!(hour.len(), 1 | 2)
            && minute.len() == 2
            && hour.bytes().chain(minute.bytes()).all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(invalid());
        }
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ── Period ───────────────────────────────────────────────────────────

/// One half of the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Period {
    #[default]
    Day,
    Night,
}

// ── DayBounds ────────────────────────────────────────────────────────

/// Where day begins and where night begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBounds {
    pub day_start: TimeOfDay,
    pub night_start: TimeOfDay,
}

impl Default for DayBounds {
    /// 07:00 → 19:00
    fn default() -> Self {
        Self {
            day_start: TimeOfDay { hour: 7, minute: 0 },
            night_start: TimeOfDay {
                hour: 19,
                minute: 0,
            },
        }
    }
}

impl DayBounds {
    pub fn new(day_start: TimeOfDay, night_start: TimeOfDay) -> Self {
        Self {
            day_start,
            night_start,
        }
    }

    /// Which period `now` falls in.
    ///
    /// Equal bounds mean it is always day. When day starts after night the
    /// day wraps past midnight.
    pub fn period_at(&self, now: TimeOfDay) -> Period {
        let Self {
            day_start,
            night_start,
        } = *self;
        let is_day = if day_start == night_start {
            true
        } else if day_start < night_start {
            day_start <= now && now < night_start
        } else {
            now >= day_start || now < night_start
        };
        if is_day { Period::Day } else { Period::Night }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn parses_short_and_long_hours() {
        assert_eq!(t("7:05"), TimeOfDay::new(7, 5).unwrap());
        assert_eq!(t("07:05").to_string(), "07:05");
        assert_eq!(t("23:59").to_string(), "23:59");
    }

    #[test]
    fn rejects_malformed_times() {
        for bad in ["", "7", "24:00", "12:60", "12:5", "ab:cd", "123:00", "-1:00", "12:00:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn serde_uses_hh_mm_strings() {
        let json = serde_json::to_string(&t("6:30")).unwrap();
        assert_eq!(json, r#""06:30""#);
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("06:30"));
        assert!(serde_json::from_str::<TimeOfDay>(r#""25:00""#).is_err());
    }

    #[test]
    fn daytime_bounds() {
        let bounds = DayBounds::default();
        assert_eq!(bounds.period_at(t("06:59")), Period::Night);
        assert_eq!(bounds.period_at(t("07:00")), Period::Day);
        assert_eq!(bounds.period_at(t("18:59")), Period::Day);
        assert_eq!(bounds.period_at(t("19:00")), Period::Night);
    }

    #[test]
    fn day_wrapping_midnight() {
        let bounds = DayBounds::new(t("22:00"), t("04:00"));
        assert_eq!(bounds.period_at(t("23:30")), Period::Day);
        assert_eq!(bounds.period_at(t("00:00")), Period::Day);
        assert_eq!(bounds.period_at(t("04:00")), Period::Night);
        assert_eq!(bounds.period_at(t("12:00")), Period::Night);
    }

    #[test]
    fn equal_bounds_are_always_day() {
        let bounds = DayBounds::new(t("08:00"), t("08:00"));
        assert_eq!(bounds.period_at(t("03:00")), Period::Day);
        assert_eq!(bounds.period_at(t("20:00")), Period::Day);
    }

    #[test]
    fn period_parses_case_insensitively() {
        assert_eq!("NIGHT".parse::<Period>().unwrap(), Period::Night);
        assert_eq!(Period::Day.to_string(), "day");
    }
}
