//! Month-scoped escalating penalty.
//!
//! ## State Transitions
//!
//! ```text
//! inactive -> stage1 (+24h) -> stage2 (+7d) -> stage3 (month end)
//!     any active stage -> resolved (penalty quest done)
//! month rollover -> inactive
//! ```
//!
//! Transitions are evaluated lazily from stored timestamps, so calling
//! [`PenaltyState::evaluate`] repeatedly with the same inputs is a no-op.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{date_key, month_end_instant, month_key, month_start};
use crate::journal::DayRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PenaltyPhase {
    Inactive,
    Active { stage: u8 },
    Resolved,
}

/// What an evaluation changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PenaltyTransition {
    RolledOver { month: String },
    Activated { month: String, missed_date: String },
    Escalated { stage: u8, expires_at: DateTime<Utc> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyState {
    pub month_key: Option<String>,
    pub active: bool,
    pub stage: u8,
    pub expires_at: Option<DateTime<Utc>>,
    pub resolved: bool,
    /// Whether this month already counted toward `lifetime_months`.
    pub counted: bool,
    /// Months in which a penalty ever activated. Survives rollover.
    pub lifetime_months: u32,
}

impl PenaltyState {
    pub fn phase(&self) -> PenaltyPhase {
        if self.resolved {
            PenaltyPhase::Resolved
        } else if self.active {
            PenaltyPhase::Active { stage: self.stage }
        } else {
            PenaltyPhase::Inactive
        }
    }

    /// Active, unresolved stage for the month containing `date`.
    pub fn open_stage_for(&self, date: NaiveDate) -> Option<u8> {
        let same_month = self.month_key.as_deref() == Some(month_key(date).as_str());
        (same_month && self.active && !self.resolved).then_some(self.stage)
    }

    /// Roll over, activate and escalate as the clock and journal dictate.
    pub fn evaluate(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
        days: &BTreeMap<String, DayRecord>,
    ) -> Vec<PenaltyTransition> {
        let mut transitions = Vec::new();

        let month = month_key(today);
        if self.month_key.as_deref() != Some(month.as_str()) {
            let lifetime_months = self.lifetime_months;
            let had_month = self.month_key.is_some();
            *self = PenaltyState {
                month_key: Some(month.clone()),
                lifetime_months,
                ..Default::default()
            };
            if had_month {
                transitions.push(PenaltyTransition::RolledOver { month: month.clone() });
            }
        }

        if !self.active && !self.resolved {
            if let Some(missed) = first_inactive_day(today, days) {
                self.active = true;
                self.stage = 1;
                self.expires_at = Some(now + Duration::hours(24));
                if !self.counted {
                    self.counted = true;
                    self.lifetime_months += 1;
                }
                log::info!("penalty activated for {month}: {missed} had no activity");
                transitions.push(PenaltyTransition::Activated {
                    month: month.clone(),
                    missed_date: missed,
                });
            }
        }

        if self.active && !self.resolved {
            while self.stage < 3 {
                let Some(expires) = self.expires_at else { break };
                if now <= expires {
                    break;
                }
                let next_expiry = if self.stage == 1 {
                    expires + Duration::days(7)
                } else {
                    month_end_instant(today)
                };
                self.stage += 1;
                self.expires_at = Some(next_expiry);
                log::info!("penalty escalated to stage {}", self.stage);
                transitions.push(PenaltyTransition::Escalated {
                    stage: self.stage,
                    expires_at: next_expiry,
                });
            }
        }

        transitions
    }

    /// Mark the month's penalty as done. Returns the stage it was resolved at,
    /// or `None` when nothing was open.
    pub fn resolve(&mut self) -> Option<u8> {
        if !self.active || self.resolved {
            return None;
        }
        let stage = self.stage;
        self.active = false;
        self.resolved = true;
        log::info!("penalty resolved at stage {stage}");
        Some(stage)
    }
}

/// First day of the month strictly before `today` with nothing logged.
fn first_inactive_day(today: NaiveDate, days: &BTreeMap<String, DayRecord>) -> Option<String> {
    let mut day = month_start(today);
    while day < today {
        let key = date_key(day);
        if !days.get(&key).is_some_and(DayRecord::has_activity) {
            return Some(key);
        }
        day = day.succ_opt()?;
    }
    None
}
