//! Document migrations for the persisted tracker state.
//!
//! Versions are applied sequentially when a document is loaded. Version 1 is
//! the unversioned browser-era shape (`profile` / `meta` / `quests` /
//! `cosmetics`); version 2 is [`TrackerState`].

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Map, Value};

use crate::calendar::{parse_date_key, week_key};
use crate::error::StorageError;
use crate::loot::Rarity;
use crate::state::{TrackerState, STATE_VERSION};

const LEGACY_KEYS: [&str; 4] = ["profile", "meta", "quests", "cosmetics"];

/// Legacy check-id slugs and their current names.
const LEGACY_SLUGS: &[(&str, &str)] = &[
    ("edzes", "workout"),
    ("mosogatas", "dishes"),
    ("ruhamosas", "laundry"),
    ("takarítas", "cleaning"),
    ("takaritas", "cleaning"),
    ("fozés", "cooking"),
    ("fozes", "cooking"),
    ("baratok", "friends"),
    ("regen", "regen"),
    ("min", "minimum"),
    ("boss", "boss"),
    ("penalty", "penalty"),
];

/// Version of a raw document. Unversioned documents carrying any legacy
/// top-level key are version 1; other unversioned documents are treated as
/// current.
pub fn detect_version(raw: &Value) -> u32 {
    if let Some(v) = raw.get("version").and_then(Value::as_u64) {
        return u32::try_from(v).unwrap_or(u32::MAX);
    }
    if LEGACY_KEYS.iter().any(|k| raw.get(*k).is_some()) {
        1
    } else {
        STATE_VERSION
    }
}

/// Bring a raw document forward to the current version and decode it.
///
/// # Errors
/// Returns an error if the migrated document still cannot be decoded,
/// e.g. when it is not a JSON object at all.
pub fn migrate(raw: Value) -> Result<TrackerState, StorageError> {
    let version = detect_version(&raw);
    let mut doc = raw;

    if version < 2 {
        log::info!("migrating legacy state document to v2");
        doc = migrate_v2(&doc);
    }
    if version > STATE_VERSION {
        log::warn!("state document version {version} is newer than {STATE_VERSION}; decoding best-effort");
    }

    let mut state: TrackerState = serde_json::from_value(doc)?;
    state.version = STATE_VERSION;
    state.progression.level = state.progression.level.max(1);
    Ok(state)
}

/// Migration v2: map the legacy shape field by field.
fn migrate_v2(legacy: &Value) -> Value {
    let empty = Value::Object(Map::new());
    let profile = legacy.get("profile").unwrap_or(&empty);
    let meta = legacy.get("meta").unwrap_or(&empty);
    let cosmetics = legacy.get("cosmetics").unwrap_or(&empty);

    let mut days = Map::new();
    if let Some(quests) = legacy.get("quests").and_then(Value::as_object) {
        for (date, day) in quests {
            days.insert(date.clone(), legacy_day(date, day));
        }
    }

    let stats: Map<String, Value> = ["STR", "END", "REC", "DISC"]
        .iter()
        .map(|k| {
            let v = profile.pointer(&format!("/stats/{k}")).and_then(Value::as_u64).unwrap_or(0);
            (k.to_string(), json!(v))
        })
        .collect();

    let claimed_weeks: Vec<String> = meta
        .get("weeklyClaims")
        .and_then(Value::as_object)
        .map(|claims| {
            claims
                .iter()
                .filter(|(_, v)| v.as_bool().unwrap_or(false))
                .filter_map(|(k, _)| legacy_week_key(k))
                .collect()
        })
        .unwrap_or_default();

    let badges: Vec<Value> = cosmetics
        .get("badges")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(|name| json!({ "name": name, "rarity": legacy_rarity(name) }))
                .collect()
        })
        .unwrap_or_default();

    let titles: Vec<Value> = cosmetics
        .get("titles")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let last_free_crate_at = meta
        .get("lastCrateDate")
        .and_then(Value::as_str)
        .and_then(|d| parse_date_key(d).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| json!(Utc.from_utc_datetime(&dt)));

    json!({
        "version": 2,
        "progression": {
            "level": profile.get("level").and_then(Value::as_u64).unwrap_or(1),
            "experience": profile.get("exp").and_then(Value::as_u64).unwrap_or(0),
            "stat_points": profile.get("unspent").and_then(Value::as_u64).unwrap_or(0),
            "stats": stats,
        },
        "days": days,
        "continuity": {
            "streak": meta.get("streak").and_then(Value::as_u64).unwrap_or(0),
            "best_streak": meta.get("bestStreak").and_then(Value::as_u64).unwrap_or(0),
            "last_closed_date": meta.get("lastClosedDate").cloned().unwrap_or(Value::Null),
            "tokens": meta.get("tokens").and_then(Value::as_u64).unwrap_or(1),
            "token_week_key": meta
                .get("tokenWeekKey")
                .and_then(Value::as_str)
                .and_then(legacy_week_key),
        },
        "challenges": { "claimed_weeks": claimed_weeks },
        "inventory": {
            "badges": badges,
            "crates": meta.get("crates").and_then(Value::as_u64).unwrap_or(0),
            "crates_opened": meta.get("openedCrates").and_then(Value::as_u64).unwrap_or(0),
            "last_free_crate_at": last_free_crate_at,
            "titles": titles,
            "equipped_title": profile.get("title").cloned().unwrap_or(Value::Null),
        },
    })
}

fn legacy_day(date: &str, day: &Value) -> Value {
    let prefix = format!("q_{date}_");
    let checks: Map<String, Value> = day
        .get("checks")
        .and_then(Value::as_object)
        .map(|checks| {
            checks
                .iter()
                .map(|(id, v)| {
                    let slug = id.strip_prefix(prefix.as_str()).unwrap_or(id.as_str());
                    let slug = LEGACY_SLUGS
                        .iter()
                        .find(|(old, _)| *old == slug)
                        .map(|(_, new)| *new)
                        .unwrap_or(slug);
                    (format!("{date}:{slug}"), json!(v.as_bool().unwrap_or(false)))
                })
                .collect()
        })
        .unwrap_or_default();

    let closed_at = day
        .get("closeTs")
        .and_then(Value::as_i64)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|t| json!(t));

    json!({
        "closed": day.get("closed").and_then(Value::as_bool).unwrap_or(false),
        "checks": checks,
        "steps": legacy_text(day.get("steps")),
        "sleep_hours": legacy_text(day.get("sleep")),
        "weight_kg": legacy_text(day.get("weight")),
        "manual_edited": day.get("manualEdited").and_then(Value::as_bool).unwrap_or(false),
        "closed_at": closed_at,
    })
}

/// Numeric-as-text field: numbers are stringified, blanks become null.
fn legacy_text(value: Option<&Value>) -> Value {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => json!(s),
        Some(Value::Number(n)) => json!(n.to_string()),
        _ => Value::Null,
    }
}

/// Legacy weeks were keyed by their Monday date.
fn legacy_week_key(raw: &str) -> Option<String> {
    if raw.contains("-W") {
        return Some(raw.to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(week_key)
}

fn legacy_rarity(name: &str) -> Rarity {
    Rarity::ALL
        .into_iter()
        .find(|r| r.badge_pool().contains(&name))
        .unwrap_or(Rarity::Common)
}
