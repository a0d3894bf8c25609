use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Reporting window selected on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Number of local calendar days covered, today included.
    pub fn days(&self) -> u64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }

    /// First local calendar day of the window ending today.
    pub fn first_day(&self, now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
        let today = local_date(now, offset);
        today
            .checked_sub_days(Days::new(self.days() - 1))
            .unwrap_or(NaiveDate::MIN)
    }

    /// UTC instant at which the window opens.
    pub fn window_start(&self, now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
        local_midnight(self.first_day(now, offset), offset)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "today" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// UTC instant of 00:00 local time on `date`.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match offset.from_local_datetime(&naive).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("week".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("today".parse::<Period>().unwrap(), Period::Day);
        assert!("decade".parse::<Period>().is_err());
    }

    #[test]
    fn test_day_window_starts_at_local_midnight() {
        // 2024-06-10 20:00 UTC is 2024-06-11 03:00 WIB
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 20, 0, 0).unwrap();
        let start = Period::Day.window_start(now, wib());
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 10, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_week_window_covers_seven_local_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 5, 0, 0).unwrap();
        let first = Period::Week.first_day(now, wib());
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
    }
}
