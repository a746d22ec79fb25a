//! The single progression document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeState;
use crate::continuity::ContinuityState;
use crate::journal::{DayRecord, ManualEdit};
use crate::loot::Inventory;
use crate::penalty::PenaltyState;
use crate::progression::ProgressionState;

/// Current document version written by [`TrackerState`].
pub const STATE_VERSION: u32 = 2;

/// Everything persisted for one install. Missing fields decode as defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerState {
    pub version: u32,
    pub progression: ProgressionState,
    /// Date key -> record. Records are created on first touch.
    pub days: BTreeMap<String, DayRecord>,
    pub continuity: ContinuityState,
    pub penalty: PenaltyState,
    pub challenges: ChallengeState,
    pub inventory: Inventory,
    pub audit: Vec<ManualEdit>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            progression: ProgressionState::default(),
            days: BTreeMap::new(),
            continuity: ContinuityState::default(),
            penalty: PenaltyState::default(),
            challenges: ChallengeState::default(),
            inventory: Inventory::default(),
            audit: Vec::new(),
        }
    }
}

impl TrackerState {
    pub fn day(&self, date: &str) -> Option<&DayRecord> {
        self.days.get(date)
    }

    /// Record for `date`, created empty on first touch.
    pub fn day_mut(&mut self, date: &str) -> &mut DayRecord {
        self.days.entry(date.to_string()).or_default()
    }

    pub fn is_closed(&self, date: &str) -> bool {
        self.days.get(date).is_some_and(|d| d.closed)
    }
}
