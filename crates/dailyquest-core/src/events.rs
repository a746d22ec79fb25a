use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::continuity::StreakChange;
use crate::loot::Rarity;
use crate::progression::Stat;

/// Every committed state change in the engine produces an Event.
/// Front ends drain them with `Engine::take_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ExperienceGained {
        amount: u64,
        reason: String,
        at: DateTime<Utc>,
    },
    LeveledUp {
        level: u32,
        levels_gained: u32,
        at: DateTime<Utc>,
    },
    StatPointSpent {
        stat: Stat,
        value: u32,
        at: DateTime<Utc>,
    },
    QuestChecked {
        date: String,
        quest_id: String,
        checked: bool,
        at: DateTime<Utc>,
    },
    DayClosed {
        date: String,
        daily_clear: bool,
        streak: u32,
        streak_change: StreakChange,
        at: DateTime<Utc>,
    },
    /// Closing an already-closed day; nothing was granted.
    DayAlreadyClosed {
        date: String,
        at: DateTime<Utc>,
    },
    DayUnlocked {
        date: String,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    TokensRefilled {
        week: String,
        tokens: u32,
        at: DateTime<Utc>,
    },
    PenaltyActivated {
        month: String,
        missed_date: String,
        at: DateTime<Utc>,
    },
    PenaltyEscalated {
        stage: u8,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    PenaltyResolved {
        month: String,
        stage: u8,
        at: DateTime<Utc>,
    },
    BossDefeated {
        month: String,
        name: String,
        at: DateTime<Utc>,
    },
    WeeklyClaimed {
        week: String,
        exp: u64,
        crates: u32,
        at: DateTime<Utc>,
    },
    CrateGranted {
        count: u32,
        reason: String,
        at: DateTime<Utc>,
    },
    CrateOpened {
        remaining: u32,
        at: DateTime<Utc>,
    },
    BadgeGranted {
        name: String,
        rarity: Rarity,
        at: DateTime<Utc>,
    },
    DuplicateBadge {
        name: String,
        rarity: Rarity,
        at: DateTime<Utc>,
    },
    TitleUnlocked {
        title: String,
        at: DateTime<Utc>,
    },
}
