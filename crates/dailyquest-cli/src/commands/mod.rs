pub mod boss;
pub mod config;
pub mod day;
pub mod loot;
pub mod stat;
pub mod status;
pub mod weekly;

use dailyquest_core::calendar::date_key;
use dailyquest_core::{Config, Database, Engine, Schedule};
use serde::Serialize;

/// Engine over the on-disk database, with the configured schedule loaded.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let schedule = match config.schedule_path.as_deref() {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Schedule::from_json_str(&json),
            Err(e) => {
                log::warn!("cannot read schedule {path}: {e}");
                Schedule::default()
            }
        },
        None => Schedule::default(),
    };
    log::debug!("loaded {} schedule rows", schedule.len());

    let db = Database::open()?;
    Ok(Engine::new(config).with_schedule(schedule).open(db))
}

/// The `--date` argument, or today's key.
pub fn date_or_today(engine: &Engine, date: Option<String>) -> String {
    date.unwrap_or_else(|| date_key(engine.today()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
