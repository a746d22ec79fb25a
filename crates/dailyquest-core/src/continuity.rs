//! Streaks and weekly streak-protect tokens.
//!
//! A single missed day can be forgiven by spending a token; tokens are
//! refilled to the base allowance once per ISO week. Two or more missed days
//! always reset the streak.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{date_key, days_between, week_key};

/// How a close affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakChange {
    /// First close ever.
    Started,
    /// Consecutive day.
    Extended,
    /// One-day gap forgiven by a token.
    Saved,
    /// Gap too long or no token left.
    Reset,
    /// Same or earlier date re-closed.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityState {
    pub streak: u32,
    pub best_streak: u32,
    pub last_closed_date: Option<String>,
    pub tokens: u32,
    pub token_week_key: Option<String>,
}

impl Default for ContinuityState {
    fn default() -> Self {
        Self {
            streak: 0,
            best_streak: 0,
            last_closed_date: None,
            tokens: 1,
            token_week_key: None,
        }
    }
}

impl ContinuityState {
    /// Refill tokens the first time this runs in a new ISO week.
    /// Returns true when a refill happened.
    pub fn on_week_tick(&mut self, today: NaiveDate, allowance: u32) -> bool {
        let week = week_key(today);
        if self.token_week_key.as_deref() == Some(week.as_str()) {
            return false;
        }
        log::debug!("token week {week}: refilling to {allowance}");
        self.token_week_key = Some(week);
        self.tokens = allowance;
        true
    }

    /// Apply the streak rule for closing `date`.
    pub fn record_close(&mut self, date: NaiveDate) -> StreakChange {
        let previous = self
            .last_closed_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        let change = match previous {
            None => {
                self.streak = 1;
                StreakChange::Started
            }
            Some(prev) => match days_between(prev, date) {
                1 => {
                    self.streak += 1;
                    StreakChange::Extended
                }
                2 if self.tokens > 0 => {
                    self.tokens -= 1;
                    self.streak += 1;
                    StreakChange::Saved
                }
                d if d > 1 => {
                    self.streak = 1;
                    StreakChange::Reset
                }
                _ => StreakChange::Unchanged,
            },
        };

        self.best_streak = self.best_streak.max(self.streak);
        self.last_closed_date = Some(date_key(date));
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_key;

    fn d(s: &str) -> NaiveDate {
        parse_date_key(s).unwrap()
    }

    fn after(last: &str, tokens: u32) -> ContinuityState {
        ContinuityState {
            streak: 4,
            best_streak: 4,
            last_closed_date: Some(last.into()),
            tokens,
            token_week_key: None,
        }
    }

    #[test]
    fn first_close_starts_streak() {
        let mut c = ContinuityState::default();
        assert_eq!(c.record_close(d("2026-01-01")), StreakChange::Started);
        assert_eq!(c.streak, 1);
        assert_eq!(c.best_streak, 1);
    }

    #[test]
    fn next_day_extends() {
        let mut c = after("2026-01-01", 0);
        assert_eq!(c.record_close(d("2026-01-02")), StreakChange::Extended);
        assert_eq!(c.streak, 5);
        assert_eq!(c.best_streak, 5);
    }

    #[test]
    fn single_gap_consumes_token() {
        let mut c = after("2026-01-01", 1);
        assert_eq!(c.record_close(d("2026-01-03")), StreakChange::Saved);
        assert_eq!(c.streak, 5);
        assert_eq!(c.tokens, 0);
    }

    #[test]
    fn single_gap_without_token_resets() {
        let mut c = after("2026-01-01", 0);
        assert_eq!(c.record_close(d("2026-01-03")), StreakChange::Reset);
        assert_eq!(c.streak, 1);
        assert_eq!(c.best_streak, 4);
    }

    #[test]
    fn long_gap_resets_even_with_tokens() {
        let mut c = after("2026-01-01", 3);
        assert_eq!(c.record_close(d("2026-01-04")), StreakChange::Reset);
        assert_eq!(c.streak, 1);
        assert_eq!(c.tokens, 3);
    }

    #[test]
    fn reclosing_earlier_date_leaves_streak() {
        let mut c = after("2026-01-03", 1);
        assert_eq!(c.record_close(d("2026-01-01")), StreakChange::Unchanged);
        assert_eq!(c.streak, 4);
        assert_eq!(c.last_closed_date.as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn week_tick_is_idempotent_within_week() {
        let mut c = ContinuityState {
            tokens: 0,
            ..Default::default()
        };
        assert!(c.on_week_tick(d("2026-01-05"), 2));
        assert_eq!(c.tokens, 2);
        c.tokens = 1;
        assert!(!c.on_week_tick(d("2026-01-11"), 2));
        assert_eq!(c.tokens, 1);
        assert!(c.on_week_tick(d("2026-01-12"), 2));
        assert_eq!(c.tokens, 2);
    }
}
