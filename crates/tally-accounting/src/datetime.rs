use std::fmt;
use std::str::FromStr;

use chrono::{
    Datelike, Duration, Local, Months, NaiveDate, NaiveTime, TimeZone, Utc,
};
use tracing::debug;

use tally_data::ValidationError;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Today in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Milliseconds since the unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The first instant of a day in the given time zone, as
/// milliseconds since the epoch.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);

    // Midnight may not exist when a DST gap starts at 00:00,
    // move forward to the first instant that does.
    for minutes in (0..=180).step_by(15) {
        let local = midnight + Duration::minutes(minutes);
        if let Some(start) = tz.from_local_datetime(&local).earliest() {
            return start.timestamp_millis();
        }
    }
    Utc.from_utc_datetime(&midnight).timestamp_millis()
}

/// The calendar date of a timestamp in the given time zone.
pub fn local_date<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.date_naive())
}

/// A calendar month, written as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(1..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(Month)
    }

    /// The month containing the date.
    pub fn of(date: NaiveDate) -> Self {
        Month(date.with_day(1).unwrap_or(date))
    }

    /// The current month in local time.
    pub fn current() -> Self {
        Self::of(today())
    }

    /// Parse a month, falling back to the current month
    /// when the input is malformed.
    pub fn parse_or_current(s: &str) -> Self {
        match s.parse() {
            Ok(month) => month,
            Err(err) => {
                debug!(%err, "using current month");
                Self::current()
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> Self {
        self.0
            .checked_add_months(Months::new(1))
            .map(Month)
            .unwrap_or(*self)
    }

    pub fn previous(&self) -> Self {
        self.0
            .checked_sub_months(Months::new(1))
            .map(Month)
            .unwrap_or(*self)
    }

    /// Number of days in the month.
    pub fn days(&self) -> u32 {
        (self.next().0 - self.0).num_days() as u32
    }

    /// Half open range `[start, end)` in epoch milliseconds
    /// from local midnight of the first day to local midnight
    /// of the first day of the next month.
    pub fn range(&self) -> (i64, i64) {
        self.range_in(&Local)
    }

    /// Same as `range` for an explicit time zone.
    pub fn range_in<Tz: TimeZone>(&self, tz: &Tz) -> (i64, i64) {
        (
            start_of_day(tz, self.0),
            start_of_day(tz, self.next().0),
        )
    }

    /// Length of the month in milliseconds, ignoring
    /// daylight saving shifts.
    pub fn millis(&self) -> i64 {
        self.days() as i64 * MILLIS_PER_DAY
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;

        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if year.len() != 4 || !digits(year) {
            return Err(invalid());
        }
        if month.is_empty() || month.len() > 2 || !digits(month) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Month::new(year, month).ok_or_else(invalid)
    }
}
