//! Weekly dungeon run: aggregate steps, sleep and closed days over an ISO week.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{date_key, week_days, week_key};
use crate::journal::DayRecord;
use crate::keyhash::KeyHasher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyChallenge {
    pub week_key: String,
    pub steps_target: u64,
    pub sleep_target: f64,
    pub clears_target: u32,
    pub reward_exp: u64,
    pub reward_crates: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub steps: f64,
    pub sleep_hours: f64,
    pub clears: u32,
}

impl WeeklyChallenge {
    /// Targets for the ISO week containing `date`, fixed per week key.
    pub fn for_date(date: NaiveDate, hasher: &dyn KeyHasher) -> Self {
        let week_key = week_key(date);
        let h = hasher.hash_key(&format!("wk:{week_key}"));
        Self {
            steps_target: 25_000 + u64::from(h % 3) * 10_000,
            sleep_target: f64::from(35 + ((h >> 2) % 3) * 7),
            clears_target: 5 + (h >> 4) % 3,
            reward_exp: 250 + u64::from((h >> 6) % 3) * 100,
            reward_crates: 1,
            week_key,
        }
    }

    pub fn is_met(&self, progress: &WeeklyProgress) -> bool {
        progress.steps >= self.steps_target as f64
            && progress.sleep_hours >= self.sleep_target
            && progress.clears >= self.clears_target
    }
}

/// Sum the seven days of the week containing `date`.
pub fn progress(date: NaiveDate, days: &BTreeMap<String, DayRecord>) -> WeeklyProgress {
    week_days(date)
        .filter_map(|day| days.get(&date_key(day)))
        .fold(WeeklyProgress::default(), |mut acc, day| {
            acc.steps += day.steps();
            acc.sleep_hours += day.sleep_hours();
            if day.closed {
                acc.clears += 1;
            }
            acc
        })
}
