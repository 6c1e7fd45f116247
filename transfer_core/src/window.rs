use crate::{CoreError, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const DAY_SECONDS: i64 = 86_400;

/// Inclusive `[from, to]` range in UTC Unix seconds covering one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampWindow {
    pub from: i64,
    pub to: i64,
}

impl TimestampWindow {
    /// Window for a `YYYY-MM-DD` date string: 00:00:00Z through 23:59:59Z.
    /// Malformed input is rejected here, before any network activity.
    pub fn for_date(date: &str) -> Result<Self> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| CoreError::InvalidDate(format!("{}: {}", date, e)))?;
        Ok(Self::for_day(day))
    }

    /// Window for a parsed calendar day
    pub fn for_day(day: NaiveDate) -> Self {
        let from = Utc
            .from_utc_datetime(&day.and_time(NaiveTime::MIN))
            .timestamp();
        Self {
            from,
            to: from + DAY_SECONDS - 1,
        }
    }

    /// Window for the current UTC day
    pub fn today() -> Self {
        Self::for_day(Utc::now().date_naive())
    }
}
