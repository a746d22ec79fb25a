use clap::Subcommand;
use dailyquest_core::{Metric, MetricsUpdate};

use super::{date_or_today, open_engine, print_json};

#[derive(Subcommand)]
pub enum DayAction {
    /// Show a day's quests and metrics
    Show {
        /// Day key (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Check (or uncheck) a quest
    Check {
        /// Quest id, e.g. "2026-01-05:minimum"
        quest_id: String,
        #[arg(long)]
        date: Option<String>,
        /// Uncheck instead
        #[arg(long)]
        off: bool,
    },
    /// Set free-text metrics; an empty value clears the field
    Metrics {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        steps: Option<String>,
        #[arg(long)]
        sleep: Option<String>,
        #[arg(long)]
        weight: Option<String>,
    },
    /// Add to a numeric metric (steps, sleep, weight)
    Add {
        metric: Metric,
        amount: f64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Close a day and collect its rewards
    Close {
        #[arg(long)]
        date: Option<String>,
    },
    /// Reopen a closed day for editing
    Unlock {
        #[arg(long)]
        date: Option<String>,
        /// Justification, required when anti-cheat is on
        #[arg(long)]
        reason: Option<String>,
    },
}

pub fn run(action: DayAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        DayAction::Show { date } => {
            let date = date_or_today(&engine, date);
            print_json(&engine.day_view(&date)?)?;
        }
        DayAction::Check {
            quest_id,
            date,
            off,
        } => {
            let date = date_or_today(&engine, date);
            let check = engine.check_quest(&date, &quest_id, !off)?;
            print_json(&check)?;
        }
        DayAction::Metrics {
            date,
            steps,
            sleep,
            weight,
        } => {
            let date = date_or_today(&engine, date);
            let update = MetricsUpdate {
                steps,
                sleep_hours: sleep,
                weight_kg: weight,
            };
            engine.set_metrics(&date, &update)?;
            print_json(&engine.day_view(&date)?)?;
        }
        DayAction::Add {
            metric,
            amount,
            date,
        } => {
            let date = date_or_today(&engine, date);
            let value = engine.quick_add(&date, metric, amount)?;
            print_json(&serde_json::json!({ "date": date, "metric": metric, "value": value }))?;
        }
        DayAction::Close { date } => {
            let date = date_or_today(&engine, date);
            let report = engine.close_day(&date)?;
            for event in engine.take_events() {
                log::info!("{event:?}");
            }
            print_json(&report)?;
        }
        DayAction::Unlock { date, reason } => {
            let date = date_or_today(&engine, date);
            engine.unlock_day(&date, reason.as_deref())?;
            println!("unlocked {date}");
        }
    }
    Ok(())
}
