//! Quest derivation.
//!
//! A day's quest list is a pure function of its date, its schedule row and
//! the month-level context (boss, penalty). Order:
//!
//! ```text
//! [penalty] [boss] required... [regeneration] [minimum fallback] metrics
//! ```

pub mod modifier;
pub mod schedule;

use serde::{Deserialize, Serialize};

use crate::challenge::BossTask;
use crate::progression::Stat;

pub use modifier::DailyModifier;
pub use schedule::{Schedule, ScheduleProvider, ScheduleRow};

/// Chore columns: (slug, label, header aliases, stat).
const CHORES: &[(&str, &str, &[&str], Stat)] = &[
    ("dishes", "Dishes", &["dishes", "Dishes", "Mosogatás", "Mosogatas"], Stat::Disc),
    ("laundry", "Laundry", &["laundry", "Laundry", "Ruhamosás", "Ruhamosas"], Stat::Disc),
    ("cleaning", "Cleaning", &["cleaning", "Cleaning", "Takarítás", "Takaritas"], Stat::Disc),
    ("cooking", "Cooking", &["cooking", "Cooking", "Főzés", "Fozes"], Stat::Disc),
    ("friends", "Friends", &["friends", "Friends", "Barátok", "Baratok"], Stat::Rec),
];

const WORKOUT_EXP: u32 = 30;
const CHORE_EXP: u32 = 10;
const REGEN_EXP: u32 = 15;
const MINIMUM_EXP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    Penalty,
    Boss,
    Workout,
    Chore,
    Regeneration,
    MinimumActivity,
    /// Input surface for steps/sleep/weight; never checked.
    Metrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestItem {
    pub id: String,
    pub label: String,
    pub required: bool,
    pub kind: QuestKind,
    /// Base experience granted when checked.
    pub exp: u32,
    pub stat: Option<Stat>,
}

impl QuestItem {
    fn new(date: &str, slug: &str, label: impl Into<String>, kind: QuestKind) -> Self {
        Self {
            id: quest_id(date, slug),
            label: label.into(),
            required: false,
            kind,
            exp: 0,
            stat: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn rewarding(mut self, exp: u32, stat: Stat) -> Self {
        self.exp = exp;
        self.stat = Some(stat);
        self
    }

    pub fn is_checkable(&self) -> bool {
        self.kind != QuestKind::Metrics
    }
}

pub fn quest_id(date: &str, slug: &str) -> String {
    format!("{date}:{slug}")
}

pub fn boss_quest_id(date: &str) -> String {
    quest_id(date, "boss")
}

pub fn penalty_quest_id(date: &str) -> String {
    quest_id(date, "penalty")
}

/// Month-level state that injects optional quests.
#[derive(Debug, Clone, Default)]
pub struct QuestContext {
    /// Boss name and chosen task, when a task is chosen and the boss is undefeated.
    pub boss: Option<(String, BossTask)>,
    /// An active, unresolved penalty stage for the date's month.
    pub penalty_stage: Option<u8>,
}

/// Build the ordered quest list for one day.
pub fn derive_quests(date: &str, row: Option<&ScheduleRow>, ctx: &QuestContext) -> Vec<QuestItem> {
    let mut quests = Vec::new();

    if let Some((name, task)) = &ctx.boss {
        quests.insert(
            0,
            QuestItem::new(date, "boss", format!("Boss {name}: {}", task.label()), QuestKind::Boss),
        );
    }
    if let Some(stage) = ctx.penalty_stage {
        quests.insert(
            0,
            QuestItem::new(
                date,
                "penalty",
                format!("Penalty (stage {stage}): 20 min brisk walk"),
                QuestKind::Penalty,
            ),
        );
    }

    if let Some(row) = row {
        if let Some(workout) = row.workout().filter(|w| schedule::truthy_cell(Some(w.as_str()))) {
            quests.push(
                QuestItem::new(date, "workout", format!("Workout: {}", workout.trim()), QuestKind::Workout)
                    .required()
                    .rewarding(WORKOUT_EXP, Stat::Str),
            );
        }
        for (slug, label, aliases, stat) in CHORES {
            if schedule::truthy_cell(row.cell(aliases).as_deref()) {
                quests.push(
                    QuestItem::new(date, slug, *label, QuestKind::Chore)
                        .required()
                        .rewarding(CHORE_EXP, *stat),
                );
            }
        }
        if row.shift().is_some_and(|s| schedule::is_night_shift(&s)) {
            quests.push(
                QuestItem::new(date, "regen", "Regeneration: 10 min stretching", QuestKind::Regeneration)
                    .rewarding(REGEN_EXP, Stat::Rec),
            );
        }
    }

    if !quests.iter().any(|q| q.required) {
        quests.push(
            QuestItem::new(date, "minimum", "Daily minimum: 10 min walk", QuestKind::MinimumActivity)
                .required()
                .rewarding(MINIMUM_EXP, Stat::End),
        );
    }

    quests.push(QuestItem::new(date, "metrics", "Steps / sleep / weight", QuestKind::Metrics));

    log::debug!(
        "derived {} quests for {date} ({} required)",
        quests.len(),
        quests.iter().filter(|q| q.required).count()
    );
    quests
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(quests: &[QuestItem]) -> Vec<&str> {
        quests.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn missing_row_yields_fallback_and_metrics() {
        let quests = derive_quests("2026-01-05", None, &QuestContext::default());
        assert_eq!(ids(&quests), vec!["2026-01-05:minimum", "2026-01-05:metrics"]);
        assert!(quests[0].required);
        assert!(!quests[1].required);
        assert!(!quests[1].is_checkable());
    }

    #[test]
    fn schedule_fields_become_required_quests() {
        let row = ScheduleRow::from_pairs([
            ("date", "2026-01-05"),
            ("Edzés javaslat", "Full body A"),
            ("Mosogatás", "x"),
            ("Takarítás", "0"),
            ("Barátok", "igen"),
        ]);
        let quests = derive_quests("2026-01-05", Some(&row), &QuestContext::default());
        assert_eq!(
            ids(&quests),
            vec![
                "2026-01-05:workout",
                "2026-01-05:dishes",
                "2026-01-05:friends",
                "2026-01-05:metrics"
            ]
        );
        assert_eq!(quests[0].label, "Workout: Full body A");
        assert_eq!(quests[2].stat, Some(Stat::Rec));
    }

    #[test]
    fn night_shift_adds_optional_regen_and_keeps_fallback() {
        let row = ScheduleRow::from_pairs([("date", "2026-01-05"), ("Műszak", "Éjszaka")]);
        let quests = derive_quests("2026-01-05", Some(&row), &QuestContext::default());
        assert_eq!(
            ids(&quests),
            vec!["2026-01-05:regen", "2026-01-05:minimum", "2026-01-05:metrics"]
        );
        assert!(!quests[0].required);
    }

    #[test]
    fn penalty_and_boss_are_prepended_and_optional() {
        let ctx = QuestContext {
            boss: Some(("Iron Golem".into(), BossTask::ExtraWalk)),
            penalty_stage: Some(2),
        };
        let quests = derive_quests("2026-01-05", None, &ctx);
        assert_eq!(
            ids(&quests),
            vec![
                "2026-01-05:penalty",
                "2026-01-05:boss",
                "2026-01-05:minimum",
                "2026-01-05:metrics"
            ]
        );
        assert!(!quests[0].required && !quests[1].required);
        assert!(quests[1].label.contains("Iron Golem"));
    }

    #[test]
    fn derivation_is_deterministic() {
        let row = ScheduleRow::from_pairs([("workout", "Run"), ("Shift", "night")]);
        let ctx = QuestContext::default();
        assert_eq!(
            derive_quests("2026-02-01", Some(&row), &ctx),
            derive_quests("2026-02-01", Some(&row), &ctx)
        );
    }
}
