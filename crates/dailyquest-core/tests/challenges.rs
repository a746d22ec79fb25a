//! Weekly challenge, monthly boss and crate flows through the engine.

use dailyquest_core::calendar::FixedClock;
use dailyquest_core::engine::{TITLE_BOSS_SLAYER, TITLE_DUNGEON_RUNNER, WEEKLY_BADGE};
use dailyquest_core::journal::DayRecord;
use dailyquest_core::loot::Badge;
use dailyquest_core::{
    BossTask, Config, CoreError, Engine, Event, Perks, ProgressError, QuestKind, Rarity,
    TrackerState,
};

fn rule(err: CoreError) -> ProgressError {
    match err {
        CoreError::Rule(e) => e,
        other => panic!("expected a rule error, got {other}"),
    }
}

fn engine_on(date: &str, state: TrackerState) -> Engine {
    Engine::new(Config::default())
        .with_clock(FixedClock::on(date).unwrap())
        .with_seed(99)
        .with_state(state)
}

/// ISO week 2026-W02 fully logged: beats every possible target tier.
fn strong_week() -> TrackerState {
    let mut state = TrackerState::default();
    for day in 5..=11 {
        state.days.insert(
            format!("2026-01-{day:02}"),
            DayRecord {
                closed: true,
                steps: Some("7000".into()),
                sleep_hours: Some("8".into()),
                ..Default::default()
            },
        );
    }
    state
}

/// Inventory owning every badge, so every draw is a duplicate.
fn all_badges() -> Vec<Badge> {
    Rarity::ALL
        .into_iter()
        .flat_map(|rarity| {
            rarity.badge_pool().iter().map(move |name| Badge {
                name: name.to_string(),
                rarity,
            })
        })
        .collect()
}

#[test]
fn weekly_claim_pays_once() {
    let mut engine = engine_on("2026-01-11", strong_week());
    let status = engine.weekly_status("2026-01-08").unwrap();
    assert!(status.met);
    assert!(!status.claimed);
    assert_eq!(status.challenge.week_key, "2026-W02");

    let claim = engine.claim_weekly("2026-01-08").unwrap();
    assert_eq!(claim.week_key, "2026-W02");
    assert_eq!(claim.exp, status.challenge.reward_exp);
    assert_eq!(claim.crates, 1);
    let inventory = &engine.state().inventory;
    assert_eq!(inventory.crates, 1);
    assert!(inventory.titles.iter().any(|t| t == TITLE_DUNGEON_RUNNER));
    assert!(inventory.has_badge(WEEKLY_BADGE));

    let err = rule(engine.claim_weekly("2026-01-11").unwrap_err());
    assert_eq!(
        err,
        ProgressError::AlreadyClaimed {
            week: "2026-W02".into()
        }
    );
    assert_eq!(engine.state().inventory.crates, 1);
}

#[test]
fn unmet_week_cannot_be_claimed() {
    let mut engine = engine_on("2026-01-14", strong_week());
    let err = rule(engine.claim_weekly("2026-01-14").unwrap_err());
    assert!(matches!(err, ProgressError::ChallengeNotMet { .. }));
    assert!(engine.state().challenges.claimed_weeks.is_empty());
}

#[test]
fn weekly_perks_boost_reward() {
    let perks = Perks {
        weekly_reward_bonus: 2.0,
        weekly_extra_crates: 2,
        ..Default::default()
    };
    let mut engine = engine_on("2026-01-11", strong_week()).with_perks(perks);
    let target = engine.weekly_status("2026-01-11").unwrap().challenge.reward_exp;
    let claim = engine.claim_weekly("2026-01-11").unwrap();
    assert_eq!(claim.exp, target * 2);
    assert_eq!(claim.crates, 3);
}

#[test]
fn boss_defeat_is_once_per_month() {
    let mut engine = engine_on("2026-02-10", TrackerState::default());
    let boss = engine
        .choose_boss_task("2026-02-10", Some(BossTask::ExtraWalk))
        .unwrap();
    assert_eq!(boss.month_key, "2026-02");

    let quests = engine.quests_for("2026-02-10").unwrap();
    assert!(quests.iter().any(|q| q.kind == QuestKind::Boss));

    engine
        .check_quest("2026-02-10", "2026-02-10:boss", true)
        .unwrap();
    let report = engine.close_day("2026-02-10").unwrap();
    assert!(report.boss_loot.is_some());

    let boss = engine.boss("2026-02-20").unwrap();
    assert!(boss.completed);
    assert_eq!(boss.completed_on.as_deref(), Some("2026-02-10"));
    assert!(engine
        .state()
        .inventory
        .titles
        .iter()
        .any(|t| t == TITLE_BOSS_SLAYER));
    assert!(engine
        .take_events()
        .iter()
        .any(|e| matches!(e, Event::BossDefeated { .. })));

    let err = rule(
        engine
            .choose_boss_task("2026-02-11", Some(BossTask::ExtraTraining))
            .unwrap_err(),
    );
    assert!(matches!(err, ProgressError::BossAlreadyDefeated { .. }));
    let quests = engine.quests_for("2026-02-11").unwrap();
    assert!(quests.iter().all(|q| q.kind != QuestKind::Boss));
}

#[test]
fn boss_task_can_be_changed_and_cleared() {
    let mut engine = engine_on("2026-02-10", TrackerState::default());
    engine
        .choose_boss_task("2026-02-10", Some(BossTask::ExtraWalk))
        .unwrap();
    let boss = engine
        .choose_boss_task("2026-02-10", Some(BossTask::ExtraTraining))
        .unwrap();
    assert_eq!(boss.task, Some(BossTask::ExtraTraining));
    let boss = engine.choose_boss_task("2026-02-10", None).unwrap();
    assert_eq!(boss.task, None);
    let quests = engine.quests_for("2026-02-10").unwrap();
    assert!(quests.iter().all(|q| q.kind != QuestKind::Boss));
}

#[test]
fn duplicate_boss_loot_becomes_a_crate() {
    let mut state = TrackerState::default();
    state.inventory.badges = all_badges();
    let owned = state.inventory.badges.len();
    let mut engine = engine_on("2026-02-10", state);

    engine
        .choose_boss_task("2026-02-10", Some(BossTask::ExtraTraining))
        .unwrap();
    engine
        .check_quest("2026-02-10", "2026-02-10:boss", true)
        .unwrap();
    let report = engine.close_day("2026-02-10").unwrap();

    assert!(report.boss_loot.unwrap().is_duplicate());
    assert!(report.free_crate);
    // One daily crate plus the duplicate fallback.
    assert_eq!(engine.state().inventory.crates, 2);
    assert_eq!(engine.state().inventory.badges.len(), owned);
}

#[test]
fn opening_without_crates_fails_cleanly() {
    let mut engine = engine_on("2026-01-05", TrackerState::default());
    engine.tick().unwrap();
    let before = engine.state().clone();
    let err = rule(engine.open_crate().unwrap_err());
    assert_eq!(err, ProgressError::NoCratesAvailable);
    assert_eq!(engine.state(), &before);
}

#[test]
fn opening_a_crate_grants_a_badge() {
    let mut state = TrackerState::default();
    state.inventory.crates = 1;
    let mut engine = engine_on("2026-01-05", state);
    let opening = engine.open_crate().unwrap();
    assert!(!opening.draw.is_duplicate());
    assert_eq!(opening.crates_left, 0);
    assert_eq!(opening.consolation_exp, 0);
    assert!(engine.state().inventory.has_badge(&opening.draw.name));
    assert_eq!(engine.state().inventory.crates_opened, 1);
}

#[test]
fn duplicate_crate_draw_pays_consolation() {
    let mut state = TrackerState::default();
    state.inventory.crates = 1;
    state.inventory.badges = all_badges();
    let mut engine = engine_on("2026-01-05", state);
    let opening = engine.open_crate().unwrap();
    assert!(opening.draw.is_duplicate());
    assert_eq!(opening.consolation_exp, 25);
    assert_eq!(engine.state().progression.experience, 25);
}

#[test]
fn titles_must_be_owned_to_equip() {
    let mut engine = engine_on("2026-01-11", strong_week());
    let err = rule(engine.equip_title(TITLE_DUNGEON_RUNNER).unwrap_err());
    assert!(matches!(err, ProgressError::UnknownTitle(_)));
    engine.claim_weekly("2026-01-11").unwrap();
    engine.equip_title(TITLE_DUNGEON_RUNNER).unwrap();
    assert_eq!(
        engine.state().inventory.equipped_title.as_deref(),
        Some(TITLE_DUNGEON_RUNNER)
    );
}
