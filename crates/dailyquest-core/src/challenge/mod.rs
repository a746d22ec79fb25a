//! Periodic objectives: the weekly dungeon run and the monthly boss.

pub mod boss;
pub mod weekly;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use boss::{BossTask, MonthlyBoss, BOSS_ROSTER};
pub use weekly::{WeeklyChallenge, WeeklyProgress};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeState {
    /// ISO week keys whose reward has been claimed.
    pub claimed_weeks: BTreeSet<String>,
    /// Month key -> boss of that month, created on first touch.
    pub bosses: BTreeMap<String, MonthlyBoss>,
}

impl ChallengeState {
    pub fn is_claimed(&self, week_key: &str) -> bool {
        self.claimed_weeks.contains(week_key)
    }

    pub fn boss(&self, month_key: &str) -> Option<&MonthlyBoss> {
        self.bosses.get(month_key)
    }

    /// Boss for the month of `date`, created from the roster if missing.
    pub fn boss_for(&mut self, date: chrono::NaiveDate) -> &mut MonthlyBoss {
        let key = crate::calendar::month_key(date);
        self.bosses
            .entry(key)
            .or_insert_with(|| MonthlyBoss::for_month(date))
    }
}
