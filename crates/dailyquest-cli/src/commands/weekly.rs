use clap::Subcommand;

use super::{date_or_today, open_engine, print_json};

#[derive(Subcommand)]
pub enum WeeklyAction {
    /// Challenge and progress for the week containing the date
    Status {
        #[arg(long)]
        date: Option<String>,
    },
    /// Claim the week's reward
    Claim {
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: WeeklyAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        WeeklyAction::Status { date } => {
            let date = date_or_today(&engine, date);
            print_json(&engine.weekly_status(&date)?)?;
        }
        WeeklyAction::Claim { date } => {
            let date = date_or_today(&engine, date);
            print_json(&engine.claim_weekly(&date)?)?;
        }
    }
    Ok(())
}
