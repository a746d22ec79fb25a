use clap::Subcommand;
use dailyquest_core::Stat;

use super::open_engine;

#[derive(Subcommand)]
pub enum StatAction {
    /// Spend one unspent point (STR, END, REC, DISC)
    Spend { stat: Stat },
}

pub fn run(action: StatAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        StatAction::Spend { stat } => {
            let value = engine.spend_stat_point(stat)?;
            println!("{stat} = {value}");
        }
    }
    Ok(())
}
