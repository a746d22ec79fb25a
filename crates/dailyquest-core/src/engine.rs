//! Day-close orchestrator.
//!
//! [`Engine`] owns the single [`TrackerState`] and is the only writer. Every
//! operation runs against a scratch copy; the copy replaces the live state
//! (and is persisted) only when the whole operation succeeded, so callers
//! never observe a half-applied close.
//!
//! ## Day lifecycle
//!
//! ```text
//! open --close_day--> closed --unlock_day--> open
//! ```
//!
//! Time-based rules (weekly token refill, penalty escalation) are evaluated
//! lazily at the start of every operation and by [`Engine::tick`].

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{RngCore, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::calendar::{date_key, month_key, parse_date_key, week_key, Clock, SystemClock};
use crate::challenge::{weekly, BossTask, MonthlyBoss, WeeklyChallenge, WeeklyProgress};
use crate::continuity::StreakChange;
use crate::error::{ProgressError, Result};
use crate::events::Event;
use crate::journal::{ManualEdit, Metric};
use crate::keyhash::{Fnv1a, KeyHasher};
use crate::loot::{GrantOutcome, LootDraw, Rarity, RarityWeights};
use crate::penalty::{PenaltyPhase, PenaltyTransition};
use crate::perks::Perks;
use crate::progression::{rank, ExpAward, LevelCurve, Stat};
use crate::quest::{
    boss_quest_id, derive_quests, penalty_quest_id, DailyModifier, QuestContext, QuestItem,
    Schedule, ScheduleProvider,
};
use crate::state::TrackerState;
use crate::storage::{migrations, Config, StateStore};

pub const TITLE_STREAK_MASTER: &str = "Streak Master";
pub const TITLE_DUNGEON_LEGEND: &str = "Dungeon Legend";
pub const TITLE_DUNGEON_RUNNER: &str = "Dungeon Runner";
pub const TITLE_BOSS_SLAYER: &str = "Boss Slayer";
pub const TITLE_REDEEMED: &str = "Redeemed";

/// Badge that comes with every weekly claim.
pub const WEEKLY_BADGE: &str = "Iron Will";

/// Outcome of a successful close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCloseReport {
    pub date: String,
    pub streak: u32,
    pub streak_change: StreakChange,
    pub daily_clear: bool,
    /// Clear or partial bonus actually awarded.
    pub bonus_exp: u64,
    pub boss_loot: Option<LootDraw>,
    pub penalty_loot: Option<LootDraw>,
    pub free_crate: bool,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCheck {
    pub quest_id: String,
    pub checked: bool,
    pub exp_gained: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrateOpening {
    pub draw: LootDraw,
    /// Experience paid instead of a duplicate badge.
    pub consolation_exp: u64,
    pub crates_left: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStatus {
    pub challenge: WeeklyChallenge,
    pub progress: WeeklyProgress,
    pub met: bool,
    pub claimed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyClaim {
    pub week_key: String,
    pub exp: u64,
    pub crates: u32,
}

/// Per-field metric edits; `None` leaves a field alone, an empty string
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsUpdate {
    pub steps: Option<String>,
    pub sleep_hours: Option<String>,
    pub weight_kg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestStatus {
    #[serde(flatten)]
    pub quest: QuestItem,
    pub checked: bool,
}

/// A day as a front end renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayView {
    pub date: String,
    pub closed: bool,
    pub modifier: DailyModifier,
    /// Display name of the modifier, e.g. "Shadow Day".
    pub modifier_name: String,
    pub quests: Vec<QuestStatus>,
    pub steps: Option<String>,
    pub sleep_hours: Option<String>,
    pub weight_kg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub date: String,
    pub level: u32,
    pub rank: String,
    pub experience: u64,
    pub exp_to_next: u64,
    pub stat_points: u32,
    pub stats: BTreeMap<Stat, u32>,
    pub streak: u32,
    pub best_streak: u32,
    pub tokens: u32,
    pub crates: u32,
    pub badges: usize,
    pub equipped_title: Option<String>,
    pub modifier: DailyModifier,
    pub penalty: PenaltyPhase,
    pub penalty_expires_at: Option<DateTime<Utc>>,
    pub penalty_months: u32,
    pub weekly: WeeklyStatus,
    pub boss: MonthlyBoss,
}

/// The progression engine.
pub struct Engine {
    state: TrackerState,
    config: Config,
    perks: Perks,
    clock: Box<dyn Clock>,
    hasher: Box<dyn KeyHasher>,
    rng: Box<dyn RngCore>,
    schedule: Box<dyn ScheduleProvider>,
    store: Option<Box<dyn StateStore>>,
    events: Vec<Event>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    /// Fresh state, wall clock, FNV-1a keys and an entropy-seeded RNG.
    /// Perks start from `config.perks`.
    pub fn new(config: Config) -> Self {
        Self {
            state: TrackerState::default(),
            perks: config.perks,
            config,
            clock: Box::new(SystemClock),
            hasher: Box::new(Fnv1a::default()),
            rng: Box::new(Mcg128Xsl64::from_entropy()),
            schedule: Box::new(Schedule::default()),
            store: None,
            events: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_hasher(mut self, hasher: impl KeyHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Seeded PCG generator; handy for reproducible runs.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(Mcg128Xsl64::seed_from_u64(seed))
    }

    pub fn with_schedule(mut self, schedule: impl ScheduleProvider + 'static) -> Self {
        self.schedule = Box::new(schedule);
        self
    }

    pub fn with_perks(mut self, perks: Perks) -> Self {
        self.perks = perks;
        self
    }

    pub fn with_state(mut self, state: TrackerState) -> Self {
        self.state = state;
        self.settle_loaded();
        self
    }

    /// Attach a store and load its document.
    ///
    /// A missing, corrupt or undecodable document falls back to a fresh
    /// state; the next successful operation overwrites it.
    pub fn open(mut self, store: impl StateStore + 'static) -> Self {
        self.state = match store.load() {
            Ok(Some(raw)) => match migrations::migrate(raw) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("stored state could not be migrated, starting fresh: {e}");
                    TrackerState::default()
                }
            },
            Ok(None) => {
                log::debug!("no stored state, starting fresh");
                TrackerState::default()
            }
            Err(e) => {
                log::warn!("stored state could not be read, starting fresh: {e}");
                TrackerState::default()
            }
        };
        self.store = Some(Box::new(store));
        if self.settle_loaded() {
            if let Some(store) = &self.store {
                if let Err(e) = store.save(&self.state) {
                    log::warn!("settled state could not be saved: {e}");
                }
            }
        }
        self
    }

    /// Re-settle experience against the configured curve, which may have
    /// changed since the state was written. Returns true when levels moved.
    fn settle_loaded(&mut self) -> bool {
        let curve = self.config.level_curve();
        let gained = self.state.progression.settle(&curve);
        if gained > 0 {
            log::info!(
                "settled {gained} level(s) against the current curve, now level {}",
                self.state.progression.level
            );
        }
        gained > 0
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn perks(&self) -> &Perks {
        &self.perks
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Drain events produced by committed operations.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn modifier(&self, date: &str) -> Result<DailyModifier> {
        let day = parse_date_key(date)?;
        Ok(DailyModifier::for_date(&date_key(day), self.hasher.as_ref()))
    }

    /// Run one operation on a scratch copy and commit it on success.
    fn apply<T>(&mut self, op: impl FnOnce(&mut Session<'_>) -> Result<T, ProgressError>) -> Result<T> {
        let mut scratch = self.state.clone();
        let mut events = Vec::new();
        let value = {
            let mut session = Session {
                state: &mut scratch,
                config: &self.config,
                perks: &self.perks,
                curve: self.config.level_curve(),
                hasher: self.hasher.as_ref(),
                schedule: self.schedule.as_ref(),
                rng: self.rng.as_mut(),
                now: self.clock.now(),
                today: self.clock.today(),
                events: &mut events,
            };
            session.refresh();
            op(&mut session)?
        };

        if scratch != self.state {
            if let Some(store) = &self.store {
                store.save(&scratch)?;
            }
            self.state = scratch;
        }
        self.events.append(&mut events);
        Ok(value)
    }

    /// Evaluate the weekly token refill and penalty escalation for now.
    /// Returns true when the state changed.
    pub fn tick(&mut self) -> Result<bool> {
        let before = self.state.clone();
        self.apply(|_| Ok(()))?;
        Ok(before != self.state)
    }

    /// Ordered quest list for a date, after bringing time-based state current.
    pub fn quests_for(&mut self, date: &str) -> Result<Vec<QuestItem>> {
        let day = parse_date_key(date)?;
        self.tick()?;
        Ok(quests_of(&self.state, self.schedule.as_ref(), day))
    }

    pub fn day_view(&mut self, date: &str) -> Result<DayView> {
        let day = parse_date_key(date)?;
        let quests = self.quests_for(date)?;
        let key = date_key(day);
        let record = self.state.day(&key).cloned().unwrap_or_default();
        let modifier = DailyModifier::for_date(&key, self.hasher.as_ref());
        Ok(DayView {
            modifier,
            modifier_name: modifier.name().to_string(),
            quests: quests
                .into_iter()
                .map(|quest| QuestStatus {
                    checked: record.is_checked(&quest.id),
                    quest,
                })
                .collect(),
            date: key,
            closed: record.closed,
            steps: record.steps,
            sleep_hours: record.sleep_hours,
            weight_kg: record.weight_kg,
        })
    }

    /// Check or uncheck a quest. Checking pays the quest's experience once
    /// per false-to-true transition; unchecking never takes it back.
    pub fn check_quest(&mut self, date: &str, quest_id: &str, checked: bool) -> Result<QuestCheck> {
        let day = parse_date_key(date)?;
        self.apply(|s| s.check_quest(day, quest_id, checked))
    }

    pub fn set_metrics(&mut self, date: &str, update: &MetricsUpdate) -> Result<()> {
        let day = parse_date_key(date)?;
        self.apply(|s| {
            let key = s.editable_day(day)?;
            let record = s.state.day_mut(&key);
            for (metric, value) in [
                (Metric::Steps, &update.steps),
                (Metric::SleepHours, &update.sleep_hours),
                (Metric::WeightKg, &update.weight_kg),
            ] {
                if let Some(value) = value {
                    record.set_metric(metric, Some(value.clone()));
                }
            }
            Ok(())
        })
    }

    /// Add to a metric; returns the new text value.
    pub fn quick_add(&mut self, date: &str, metric: Metric, amount: f64) -> Result<Option<String>> {
        let day = parse_date_key(date)?;
        self.apply(|s| {
            let key = s.editable_day(day)?;
            let record = s.state.day_mut(&key);
            record.quick_add(metric, amount);
            Ok(record.metric(metric).map(str::to_string))
        })
    }

    /// Finalize a day. Closing an already-closed day fails with
    /// [`ProgressError::AlreadyClosed`] and grants nothing.
    pub fn close_day(&mut self, date: &str) -> Result<DayCloseReport> {
        let day = parse_date_key(date)?;
        self.apply(|s| s.close_day(day))
    }

    /// Reopen a closed day for editing. Rewards already granted stay.
    pub fn unlock_day(&mut self, date: &str, reason: Option<&str>) -> Result<()> {
        let day = parse_date_key(date)?;
        self.apply(|s| s.unlock_day(day, reason))
    }

    pub fn spend_stat_point(&mut self, stat: Stat) -> Result<u32> {
        self.apply(|s| {
            let value = s.state.progression.spend_stat_point(stat)?;
            s.events.push(Event::StatPointSpent {
                stat,
                value,
                at: s.now,
            });
            Ok(value)
        })
    }

    pub fn open_crate(&mut self) -> Result<CrateOpening> {
        self.apply(|s| s.open_crate())
    }

    pub fn weekly_status(&mut self, date: &str) -> Result<WeeklyStatus> {
        let day = parse_date_key(date)?;
        self.tick()?;
        Ok(weekly_status_of(&self.state, self.hasher.as_ref(), day))
    }

    pub fn claim_weekly(&mut self, date: &str) -> Result<WeeklyClaim> {
        let day = parse_date_key(date)?;
        self.apply(|s| s.claim_weekly(day))
    }

    /// The boss of the month containing `date`.
    pub fn boss(&self, date: &str) -> Result<MonthlyBoss> {
        let day = parse_date_key(date)?;
        Ok(boss_of(&self.state, day))
    }

    /// Choose, change or clear (`None`) the boss task for the month.
    pub fn choose_boss_task(&mut self, date: &str, task: Option<BossTask>) -> Result<MonthlyBoss> {
        let day = parse_date_key(date)?;
        self.apply(|s| {
            let boss = s.state.challenges.boss_for(day);
            boss.choose_task(task)?;
            log::debug!("boss {} task set to {:?}", boss.name, task);
            Ok(boss.clone())
        })
    }

    pub fn equip_title(&mut self, title: &str) -> Result<()> {
        self.apply(|s| Ok(s.state.inventory.equip_title(title)?))
    }

    pub fn status(&mut self) -> Result<StatusSnapshot> {
        self.tick()?;
        let today = self.clock.today();
        let state = &self.state;
        let progression = &state.progression;
        Ok(StatusSnapshot {
            date: date_key(today),
            level: progression.level,
            rank: rank(progression.level).to_string(),
            experience: progression.experience,
            exp_to_next: self.config.level_curve().exp_required_for_next(progression.level),
            stat_points: progression.stat_points,
            stats: progression.stats.clone(),
            streak: state.continuity.streak,
            best_streak: state.continuity.best_streak,
            tokens: state.continuity.tokens,
            crates: state.inventory.crates,
            badges: state.inventory.badges.len(),
            equipped_title: state.inventory.equipped_title.clone(),
            modifier: DailyModifier::for_date(&date_key(today), self.hasher.as_ref()),
            penalty: state.penalty.phase(),
            penalty_expires_at: state.penalty.expires_at,
            penalty_months: state.penalty.lifetime_months,
            weekly: weekly_status_of(state, self.hasher.as_ref(), today),
            boss: boss_of(state, today),
        })
    }
}

fn quests_of(state: &TrackerState, schedule: &dyn ScheduleProvider, day: NaiveDate) -> Vec<QuestItem> {
    let key = date_key(day);
    let ctx = QuestContext {
        boss: state
            .challenges
            .boss(&month_key(day))
            .and_then(MonthlyBoss::open_quest),
        penalty_stage: state.penalty.open_stage_for(day),
    };
    derive_quests(&key, schedule.row(&key), &ctx)
}

fn weekly_status_of(state: &TrackerState, hasher: &dyn KeyHasher, day: NaiveDate) -> WeeklyStatus {
    let challenge = WeeklyChallenge::for_date(day, hasher);
    let progress = weekly::progress(day, &state.days);
    WeeklyStatus {
        met: challenge.is_met(&progress),
        claimed: state.challenges.is_claimed(&challenge.week_key),
        challenge,
        progress,
    }
}

fn boss_of(state: &TrackerState, day: NaiveDate) -> MonthlyBoss {
    state
        .challenges
        .boss(&month_key(day))
        .cloned()
        .unwrap_or_else(|| MonthlyBoss::for_month(day))
}

/// Borrowed view of the engine for the duration of one operation.
struct Session<'a> {
    state: &'a mut TrackerState,
    config: &'a Config,
    perks: &'a Perks,
    curve: LevelCurve,
    hasher: &'a dyn KeyHasher,
    schedule: &'a dyn ScheduleProvider,
    rng: &'a mut dyn RngCore,
    now: DateTime<Utc>,
    today: NaiveDate,
    events: &'a mut Vec<Event>,
}

impl Session<'_> {
    fn refresh(&mut self) {
        let allowance = self.config.continuity.base_tokens + self.perks.extra_weekly_tokens;
        if self.state.continuity.on_week_tick(self.today, allowance) {
            self.events.push(Event::TokensRefilled {
                week: week_key(self.today),
                tokens: allowance,
                at: self.now,
            });
        }

        for transition in self.state.penalty.evaluate(self.today, self.now, &self.state.days) {
            match transition {
                PenaltyTransition::RolledOver { month } => {
                    log::debug!("penalty rolled over to {month}");
                }
                PenaltyTransition::Activated { month, missed_date } => {
                    self.events.push(Event::PenaltyActivated {
                        month,
                        missed_date,
                        at: self.now,
                    });
                }
                PenaltyTransition::Escalated { stage, expires_at } => {
                    self.events.push(Event::PenaltyEscalated {
                        stage,
                        expires_at,
                        at: self.now,
                    });
                }
            }
        }
    }

    fn award(&mut self, amount: f64, multiplier: f64, reason: &str) -> ExpAward {
        let award = self
            .state
            .progression
            .award_experience(amount, multiplier, &self.curve);
        if award.gained > 0 {
            self.events.push(Event::ExperienceGained {
                amount: award.gained,
                reason: reason.to_string(),
                at: self.now,
            });
        }
        if award.leveled_up() {
            log::info!("level up: now level {} ({reason})", award.level);
            self.events.push(Event::LeveledUp {
                level: award.level,
                levels_gained: award.levels_gained,
                at: self.now,
            });
        }
        award
    }

    fn unlock_title(&mut self, title: &str) {
        if self.state.inventory.unlock_title(title) {
            log::info!("title unlocked: {title}");
            self.events.push(Event::TitleUnlocked {
                title: title.to_string(),
                at: self.now,
            });
        }
    }

    fn grant_crates(&mut self, count: u32, reason: &str) {
        if count == 0 {
            return;
        }
        self.state.inventory.crates += count;
        self.events.push(Event::CrateGranted {
            count,
            reason: reason.to_string(),
            at: self.now,
        });
    }

    fn roll(&mut self, weights: &RarityWeights) -> LootDraw {
        let draw = self.state.inventory.roll(weights, self.rng);
        self.record_badge(&draw.name, draw.rarity, draw.outcome);
        draw
    }

    fn record_badge(&mut self, name: &str, rarity: Rarity, outcome: GrantOutcome) {
        let event = match outcome {
            GrantOutcome::Granted => Event::BadgeGranted {
                name: name.to_string(),
                rarity,
                at: self.now,
            },
            GrantOutcome::Duplicate => Event::DuplicateBadge {
                name: name.to_string(),
                rarity,
                at: self.now,
            },
        };
        self.events.push(event);
    }

    /// Date key of a day that may still be edited.
    fn editable_day(&self, day: NaiveDate) -> Result<String, ProgressError> {
        let key = date_key(day);
        if self.state.is_closed(&key) {
            return Err(ProgressError::DayLocked { date: key });
        }
        Ok(key)
    }

    fn check_quest(&mut self, day: NaiveDate, quest_id: &str, checked: bool) -> Result<QuestCheck, ProgressError> {
        let key = self.editable_day(day)?;
        let quest = quests_of(self.state, self.schedule, day)
            .into_iter()
            .find(|q| q.id == quest_id && q.is_checkable())
            .ok_or_else(|| ProgressError::UnknownQuest {
                date: key.clone(),
                quest_id: quest_id.to_string(),
            })?;

        let record = self.state.day_mut(&key);
        let was_checked = record.is_checked(&quest.id);
        record.checks.insert(quest.id.clone(), checked);
        self.events.push(Event::QuestChecked {
            date: key.clone(),
            quest_id: quest.id.clone(),
            checked,
            at: self.now,
        });

        let mut exp_gained = 0;
        if checked && !was_checked && quest.exp > 0 {
            let affinity = quest
                .stat
                .map_or(1.0, |stat| self.state.progression.affinity(stat));
            let modifier = DailyModifier::for_date(&key, self.hasher).exp_multiplier();
            let multiplier = affinity * modifier * self.perks.exp_multiplier;
            exp_gained = self.award(f64::from(quest.exp), multiplier, &quest.label).gained;
        }

        Ok(QuestCheck {
            quest_id: quest.id,
            checked,
            exp_gained,
        })
    }

    fn close_day(&mut self, day: NaiveDate) -> Result<DayCloseReport, ProgressError> {
        let key = date_key(day);
        if self.state.is_closed(&key) {
            log::debug!("{key} is already closed");
            return Err(ProgressError::AlreadyClosed { date: key });
        }

        let quests = quests_of(self.state, self.schedule, day);
        let record = self.state.day_mut(&key);
        let had_activity = record.has_activity();
        let daily_clear = quests
            .iter()
            .filter(|q| q.required)
            .all(|q| record.is_checked(&q.id));
        let boss_checked = record.is_checked(&boss_quest_id(&key));
        let penalty_checked = record.is_checked(&penalty_quest_id(&key));
        record.closed = true;
        record.closed_at = Some(self.now);

        let streak_change = self.state.continuity.record_close(day);
        let streak = self.state.continuity.streak;
        match streak_change {
            StreakChange::Saved => log::info!("streak saved with a token on {key}, streak {streak}"),
            StreakChange::Reset => log::info!("streak reset on {key}"),
            _ => {}
        }

        let mut bonus_exp = 0;
        if daily_clear {
            let streak_mult = 1.0 + f64::from(streak.min(30)) * 0.005;
            let disc_mult = 1.0 + f64::from(self.state.progression.stat(Stat::Disc)) * 0.005;
            let bonus = (self.config.rewards.daily_clear_exp as f64
                * streak_mult
                * disc_mult
                * self.perks.daily_clear_bonus)
                .round();
            bonus_exp = self.award(bonus, 1.0, "daily clear").gained;
            if streak >= 7 {
                self.unlock_title(TITLE_STREAK_MASTER);
            }
            if streak >= 30 {
                self.unlock_title(TITLE_DUNGEON_LEGEND);
            }
        } else if had_activity {
            bonus_exp = self
                .award(self.config.rewards.partial_exp as f64, 1.0, "partial day")
                .gained;
        }

        let boss_loot = if boss_checked { self.defeat_boss(day) } else { None };
        let penalty_loot = if penalty_checked {
            self.resolve_penalty(day)
        } else {
            None
        };

        let free_crate = self.grant_free_crate();

        log::info!("closed {key}: clear={daily_clear}, streak={streak}");
        self.events.push(Event::DayClosed {
            date: key.clone(),
            daily_clear,
            streak,
            streak_change,
            at: self.now,
        });

        Ok(DayCloseReport {
            date: key,
            streak,
            streak_change,
            daily_clear,
            bonus_exp,
            boss_loot,
            penalty_loot,
            free_crate,
            level: self.state.progression.level,
        })
    }

    fn defeat_boss(&mut self, day: NaiveDate) -> Option<LootDraw> {
        let boss = self.state.challenges.boss(&month_key(day))?;
        if boss.completed || boss.task.is_none() {
            return None;
        }
        let name = boss.name.clone();

        let key = date_key(day);
        let boss = self.state.challenges.boss_for(day);
        boss.completed = true;
        boss.completed_on = Some(key);

        self.award(
            self.config.rewards.boss_exp as f64,
            self.perks.boss_reward_bonus,
            "boss defeated",
        );
        let draw = self.roll(&RarityWeights::BOSS);
        if draw.is_duplicate() {
            self.grant_crates(1, "duplicate boss loot");
        }
        self.unlock_title(TITLE_BOSS_SLAYER);

        log::info!("boss {name} defeated");
        self.events.push(Event::BossDefeated {
            month: month_key(day),
            name,
            at: self.now,
        });
        Some(draw)
    }

    fn resolve_penalty(&mut self, day: NaiveDate) -> Option<LootDraw> {
        self.state.penalty.open_stage_for(day)?;
        let stage = self.state.penalty.resolve()?;

        self.award(
            self.config.rewards.penalty_clear_exp as f64,
            1.0,
            "penalty cleared",
        );
        let draw = self.roll(&RarityWeights::PENALTY);
        if draw.is_duplicate() {
            self.award(self.config.rewards.duplicate_exp as f64, 1.0, "duplicate badge");
        }
        self.unlock_title(TITLE_REDEEMED);

        self.events.push(Event::PenaltyResolved {
            month: month_key(day),
            stage,
            at: self.now,
        });
        Some(draw)
    }

    fn grant_free_crate(&mut self) -> bool {
        let interval = Duration::hours(i64::from(self.config.rewards.free_crate_hours));
        let due = self
            .state
            .inventory
            .last_free_crate_at
            .map_or(true, |last| self.now - last >= interval);
        if due {
            self.state.inventory.last_free_crate_at = Some(self.now);
            self.grant_crates(1, "daily crate");
        }
        due
    }

    fn unlock_day(&mut self, day: NaiveDate, reason: Option<&str>) -> Result<(), ProgressError> {
        let key = date_key(day);
        if !self.state.is_closed(&key) {
            return Err(ProgressError::NotClosed { date: key });
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if self.config.journal.anti_cheat {
            let reason = reason.ok_or(ProgressError::JustificationRequired)?;
            self.state.audit.push(ManualEdit::new(&key, self.now, reason));
            self.state.day_mut(&key).manual_edited = true;
        }

        let record = self.state.day_mut(&key);
        record.closed = false;
        record.closed_at = None;

        log::info!("unlocked {key}");
        self.events.push(Event::DayUnlocked {
            date: key,
            reason: reason.map(str::to_string),
            at: self.now,
        });
        Ok(())
    }

    fn open_crate(&mut self) -> Result<CrateOpening, ProgressError> {
        let draw = self.state.inventory.open_crate(self.rng)?;
        self.record_badge(&draw.name, draw.rarity, draw.outcome);
        let crates_left = self.state.inventory.crates;
        self.events.push(Event::CrateOpened {
            remaining: crates_left,
            at: self.now,
        });

        let consolation_exp = if draw.is_duplicate() {
            self.award(self.config.rewards.duplicate_exp as f64, 1.0, "duplicate badge")
                .gained
        } else {
            0
        };

        Ok(CrateOpening {
            draw,
            consolation_exp,
            crates_left,
        })
    }

    fn claim_weekly(&mut self, day: NaiveDate) -> Result<WeeklyClaim, ProgressError> {
        let status = weekly_status_of(self.state, self.hasher, day);
        let week = status.challenge.week_key.clone();
        if status.claimed {
            return Err(ProgressError::AlreadyClaimed { week });
        }
        if !status.met {
            return Err(ProgressError::ChallengeNotMet { week });
        }

        self.state.challenges.claimed_weeks.insert(week.clone());
        let exp = self
            .award(
                status.challenge.reward_exp as f64,
                self.perks.weekly_reward_bonus,
                "weekly challenge",
            )
            .gained;
        let crates = status.challenge.reward_crates + self.perks.weekly_extra_crates;
        self.grant_crates(crates, "weekly challenge");
        self.unlock_title(TITLE_DUNGEON_RUNNER);
        let outcome = self.state.inventory.grant_badge(WEEKLY_BADGE, Rarity::Rare);
        self.record_badge(WEEKLY_BADGE, Rarity::Rare, outcome);

        log::info!("weekly challenge {week} claimed");
        self.events.push(Event::WeeklyClaimed {
            week: week.clone(),
            exp,
            crates,
            at: self.now,
        });
        Ok(WeeklyClaim {
            week_key: week,
            exp,
            crates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use crate::storage::MemoryStore;

    fn engine_on(date: &str) -> (Engine, FixedClock) {
        let clock = FixedClock::on(date).unwrap();
        let engine = Engine::default().with_clock(clock.clone()).with_seed(7);
        (engine, clock)
    }

    #[test]
    fn rule_error_leaves_state_untouched() {
        let (mut engine, _) = engine_on("2026-01-05");
        engine.tick().unwrap();
        let before = engine.state().clone();
        let err = engine.open_crate().unwrap_err();
        assert!(matches!(err, crate::CoreError::Rule(ProgressError::NoCratesAvailable)));
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn check_pays_once_per_transition() {
        let (mut engine, _) = engine_on("2026-01-05");
        let id = "2026-01-05:minimum";
        let first = engine.check_quest("2026-01-05", id, true).unwrap();
        assert!(first.exp_gained > 0);
        assert_eq!(engine.check_quest("2026-01-05", id, true).unwrap().exp_gained, 0);
        let exp = engine.state().progression.experience;
        engine.check_quest("2026-01-05", id, false).unwrap();
        assert_eq!(engine.state().progression.experience, exp);
    }

    #[test]
    fn metrics_quest_cannot_be_checked() {
        let (mut engine, _) = engine_on("2026-01-05");
        let err = engine
            .check_quest("2026-01-05", "2026-01-05:metrics", true)
            .unwrap_err();
        assert!(matches!(err, crate::CoreError::Rule(ProgressError::UnknownQuest { .. })));
    }

    #[test]
    fn closed_day_rejects_edits() {
        let (mut engine, _) = engine_on("2026-01-05");
        engine.close_day("2026-01-05").unwrap();
        let err = engine
            .quick_add("2026-01-05", Metric::Steps, 100.0)
            .unwrap_err();
        assert!(matches!(err, crate::CoreError::Rule(ProgressError::DayLocked { .. })));
    }

    #[test]
    fn committed_operations_are_persisted() {
        let store = MemoryStore::new();
        let (engine, _) = engine_on("2026-01-05");
        let mut engine = engine.open(store.clone());
        engine.quick_add("2026-01-05", Metric::Steps, 2500.0).unwrap();
        let raw = store.raw().unwrap();
        assert!(raw.contains("2500"));
    }

    #[test]
    fn corrupt_store_starts_fresh() {
        let (engine, _) = engine_on("2026-01-05");
        let engine = engine.open(MemoryStore::with_raw("{broken"));
        assert_eq!(engine.state(), &TrackerState::default());
    }

    #[test]
    fn events_are_drained() {
        let (mut engine, _) = engine_on("2026-01-05");
        engine.close_day("2026-01-05").unwrap();
        let events = engine.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::DayClosed { .. })));
        assert!(engine.take_events().is_empty());
    }

    #[test]
    fn day_view_names_its_modifier() {
        let (mut engine, _) = engine_on("2026-01-05");
        let view = engine.day_view("2026-01-05").unwrap();
        assert_eq!(view.modifier_name, view.modifier.name());
        assert!(view.modifier_name.ends_with("Day"));
    }

    #[test]
    fn status_summarizes_fresh_state() {
        let (mut engine, _) = engine_on("2026-01-05");
        let status = engine.status().unwrap();
        assert_eq!(status.date, "2026-01-05");
        assert_eq!(status.level, 1);
        assert_eq!(status.rank, "E");
        assert_eq!(status.exp_to_next, 120);
        assert_eq!(status.tokens, 1);
        assert_eq!(status.weekly.challenge.week_key, "2026-W02");
        assert_eq!(status.boss.month_key, "2026-01");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["stats"]["STR"], 0);
    }
}
