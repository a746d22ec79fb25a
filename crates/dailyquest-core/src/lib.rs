//! # Dailyquest Core Library
//!
//! This library provides the rules of dailyquest, a personal progress
//! tracker that turns logged daily activity into role-playing-game style
//! progression. A standalone CLI drives the same library.
//!
//! ## Architecture
//!
//! - **Engine**: the day-close orchestrator; the single writer of the
//!   tracker state, applying every operation atomically
//! - **Rules**: progression ledger, quest derivation, streak continuity,
//!   monthly penalty, weekly and boss challenges, loot
//! - **Storage**: SQLite document storage with versioned document
//!   migrations, and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: operations on the tracker state
//! - [`TrackerState`]: the persisted document
//! - [`Database`]: SQLite state store
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod challenge;
pub mod continuity;
pub mod engine;
pub mod error;
pub mod events;
pub mod journal;
pub mod keyhash;
pub mod loot;
pub mod penalty;
pub mod perks;
pub mod progression;
pub mod quest;
pub mod state;
pub mod storage;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use challenge::{BossTask, MonthlyBoss, WeeklyChallenge, WeeklyProgress};
pub use continuity::StreakChange;
pub use engine::{
    CrateOpening, DayCloseReport, DayView, Engine, MetricsUpdate, QuestCheck, StatusSnapshot,
    WeeklyClaim, WeeklyStatus,
};
pub use error::{ConfigError, CoreError, ProgressError, StorageError};
pub use events::Event;
pub use journal::{DayRecord, Metric};
pub use keyhash::{Fnv1a, KeyHasher};
pub use loot::{Inventory, LootDraw, Rarity, RarityWeights};
pub use penalty::PenaltyPhase;
pub use perks::Perks;
pub use progression::{LevelCurve, ProgressionState, Stat};
pub use quest::{DailyModifier, QuestItem, QuestKind, Schedule, ScheduleProvider, ScheduleRow};
pub use state::TrackerState;
pub use storage::{Config, Database, MemoryStore, StateStore};
