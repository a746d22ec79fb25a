use clap::Subcommand;
use dailyquest_core::BossTask;

use super::{date_or_today, open_engine, print_json};

#[derive(Subcommand)]
pub enum BossAction {
    /// Show the boss of the month containing the date
    Show {
        #[arg(long)]
        date: Option<String>,
    },
    /// Pick the boss task (walk, training)
    Choose {
        task: BossTask,
        #[arg(long)]
        date: Option<String>,
    },
    /// Drop the chosen task
    Clear {
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: BossAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    let boss = match action {
        BossAction::Show { date } => {
            let date = date_or_today(&engine, date);
            engine.boss(&date)?
        }
        BossAction::Choose { task, date } => {
            let date = date_or_today(&engine, date);
            engine.choose_boss_task(&date, Some(task))?
        }
        BossAction::Clear { date } => {
            let date = date_or_today(&engine, date);
            engine.choose_boss_task(&date, None)?
        }
    };
    print_json(&boss)
}
