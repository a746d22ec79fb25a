//! Monthly boss.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::month_key;
use crate::error::ProgressError;

pub const BOSS_ROSTER: [&str; 6] = [
    "Iron Golem",
    "Frost Wyrm",
    "Ant King",
    "Red Gate Warden",
    "Shadow Knight",
    "Demon Castle Lord",
];

/// The extra effort the user commits to for the month's boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossTask {
    ExtraWalk,
    ExtraTraining,
}

impl BossTask {
    pub fn label(&self) -> &'static str {
        match self {
            BossTask::ExtraWalk => "15 min extra walk",
            BossTask::ExtraTraining => "extra training block",
        }
    }
}

impl std::str::FromStr for BossTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "extra_walk" | "walk" => Ok(BossTask::ExtraWalk),
            "extra_training" | "training" => Ok(BossTask::ExtraTraining),
            other => Err(format!("unknown boss task: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBoss {
    pub month_key: String,
    pub name: String,
    #[serde(default)]
    pub task: Option<BossTask>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_on: Option<String>,
}

impl MonthlyBoss {
    /// Roster pick by `(year * 12 + month0) mod roster size`.
    pub fn for_month(date: NaiveDate) -> Self {
        let index = (i64::from(date.year()) * 12 + i64::from(date.month0()))
            .rem_euclid(BOSS_ROSTER.len() as i64) as usize;
        Self {
            month_key: month_key(date),
            name: BOSS_ROSTER[index].to_string(),
            task: None,
            completed: false,
            completed_on: None,
        }
    }

    /// Choose, change or clear the task. Locked once the boss is defeated.
    pub fn choose_task(&mut self, task: Option<BossTask>) -> Result<(), ProgressError> {
        if self.completed {
            return Err(ProgressError::BossAlreadyDefeated {
                month: self.month_key.clone(),
            });
        }
        self.task = task;
        Ok(())
    }

    /// Name and task while the boss can still be fought.
    pub fn open_quest(&self) -> Option<(String, BossTask)> {
        match (self.completed, self.task) {
            (false, Some(task)) => Some((self.name.clone(), task)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_key;

    #[test]
    fn roster_pick_is_stable_per_month() {
        let a = MonthlyBoss::for_month(parse_date_key("2026-01-03").unwrap());
        let b = MonthlyBoss::for_month(parse_date_key("2026-01-28").unwrap());
        let c = MonthlyBoss::for_month(parse_date_key("2026-02-01").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.month_key, "2026-01");
        // 2026 * 12 = 24312, divisible by 6.
        assert_eq!(a.name, BOSS_ROSTER[0]);
        assert_eq!(c.name, BOSS_ROSTER[1]);
    }

    #[test]
    fn task_choice_is_idempotent_until_defeat() {
        let mut boss = MonthlyBoss::for_month(parse_date_key("2026-01-03").unwrap());
        assert!(boss.open_quest().is_none());
        boss.choose_task(Some(BossTask::ExtraWalk)).unwrap();
        boss.choose_task(Some(BossTask::ExtraWalk)).unwrap();
        assert_eq!(boss.task, Some(BossTask::ExtraWalk));
        boss.choose_task(None).unwrap();
        assert!(boss.open_quest().is_none());

        boss.choose_task(Some(BossTask::ExtraTraining)).unwrap();
        boss.completed = true;
        assert!(matches!(
            boss.choose_task(None),
            Err(ProgressError::BossAlreadyDefeated { .. })
        ));
        assert!(boss.open_quest().is_none());
    }

    #[test]
    fn task_parses_aliases() {
        assert_eq!("extra-walk".parse::<BossTask>(), Ok(BossTask::ExtraWalk));
        assert_eq!("Training".parse::<BossTask>(), Ok(BossTask::ExtraTraining));
        assert!("nap".parse::<BossTask>().is_err());
    }
}
