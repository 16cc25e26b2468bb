//! # Calendar Periods
//!
//! Sales history is asked for in calendar days as the pharmacy sees them
//! (local time), while timestamps are stored in UTC. `DateRange` turns an
//! inclusive span of local days into a half-open UTC interval.
//!
//! ```text
//! start_date=2026-03-01  end_date=2026-03-02   (local, inclusive)
//!        │                      │
//!        ▼                      ▼
//! [2026-03-01 00:00 local,  2026-03-03 00:00 local)
//!        │                      │
//!        ▼                      ▼
//! [from_utc,                 until_utc)            created_at >= from AND < until
//! ```

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Wire format for dates in query strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ValidationResult<Self> {
        if start > end {
            return Err(ValidationError::Inconsistent {
                field: "start_date".to_string(),
                reason: "must not be after end_date".to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// Parses `YYYY-MM-DD` strings.
    ///
    /// ```rust
    /// use rxpos_core::period::DateRange;
    ///
    /// assert!(DateRange::parse("2026-03-01", "2026-03-31").is_ok());
    /// assert!(DateRange::parse("2026-03-31", "2026-03-01").is_err());
    /// assert!(DateRange::parse("03/01/2026", "2026-03-31").is_err());
    /// ```
    pub fn parse(start: &str, end: &str) -> ValidationResult<Self> {
        DateRange::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            start: date,
            end: date,
        }
    }

    /// Today in the server's local timezone.
    pub fn today() -> Self {
        DateRange::day(Local::now().date_naive())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Half-open UTC interval `[from, until)` covering every day of the
    /// range in timezone `tz`.
    pub fn utc_bounds<Tz: TimeZone>(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let until_day = self.end.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
        (start_of_day(tz, self.start), start_of_day(tz, until_day))
    }

    /// `utc_bounds` in the server's local timezone.
    pub fn local_utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.utc_bounds(&Local)
    }
}

fn parse_date(field: &str, raw: &str) -> ValidationResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD".to_string(),
    })
}

/// First instant of `date` in `tz`. When local midnight falls in a DST gap
/// this is the first valid local time after the gap.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // Transitions land on quarter hours.
    (0..=24 * 4)
        .filter_map(|quarter| midnight.checked_add_signed(TimeDelta::minutes(15 * quarter)))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
