//! Calendar keys and the injectable clock.
//!
//! Days are keyed `YYYY-MM-DD`, weeks by ISO week (`2026-W03`), months by
//! `YYYY-MM`. All time-based rules read "now" through a [`Clock`] so tests can
//! pin and advance it.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};

use crate::error::ProgressError;

/// Parse a `YYYY-MM-DD` date key.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, ProgressError> {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
        .map_err(|_| ProgressError::InvalidDate(key.to_string()))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// ISO week identifier, e.g. `2026-W01`.
pub fn week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// The seven days (Monday..Sunday) of the ISO week containing `date`.
pub fn week_days(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let start = week_start(date);
    (0..7).map(move |i| start + Duration::days(i))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last instant of the calendar month containing `date` (UTC).
pub fn month_end_instant(date: NaiveDate) -> DateTime<Utc> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let next_month = NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt));
    match next_month {
        Some(start) => start - Duration::milliseconds(1),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Source of "now" for every time-based rule.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// The user's calendar day.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; the calendar day follows the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    /// Noon (UTC) of the given date key.
    pub fn on(date: &str) -> Result<Self, ProgressError> {
        let day = parse_date_key(date)?;
        let noon = day
            .and_hms_opt(12, 0, 0)
            .ok_or_else(|| ProgressError::InvalidDate(date.to_string()))?;
        Ok(Self::at(Utc.from_utc_datetime(&noon)))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn today(&self) -> NaiveDate {
        self.now.get().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    #[test]
    fn week_key_follows_iso_year() {
        // 2026-01-01 is a Thursday, so it belongs to 2026-W01.
        assert_eq!(week_key(d("2026-01-01")), "2026-W01");
        // 2027-01-01 is a Friday and still belongs to 2026-W53.
        assert_eq!(week_key(d("2027-01-01")), "2026-W53");
    }

    #[test]
    fn week_days_start_on_monday() {
        let days: Vec<_> = week_days(d("2026-01-08")).collect();
        assert_eq!(days.len(), 7);
        assert_eq!(date_key(days[0]), "2026-01-05");
        assert_eq!(date_key(days[6]), "2026-01-11");
    }

    #[test]
    fn month_end_is_last_instant() {
        let end = month_end_instant(d("2026-02-10"));
        assert_eq!(end.to_rfc3339(), "2026-02-28T23:59:59.999+00:00");
        let dec = month_end_instant(d("2026-12-01"));
        assert_eq!(dec.date_naive(), d("2026-12-31"));
    }

    #[test]
    fn invalid_date_key_is_rejected() {
        assert!(matches!(
            parse_date_key("2026-13-01"),
            Err(ProgressError::InvalidDate(_))
        ));
    }

    #[test]
    fn fixed_clock_clones_share_time() {
        let clock = FixedClock::on("2026-01-01").unwrap();
        let other = clock.clone();
        clock.advance(Duration::days(2));
        assert_eq!(date_key(other.today()), "2026-01-03");
    }
}
