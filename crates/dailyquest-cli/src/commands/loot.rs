use clap::Subcommand;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum LootAction {
    /// Open one crate
    Open,
    /// List owned badges, titles and crates
    List,
    /// Equip an owned title
    Equip { title: String },
}

pub fn run(action: LootAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;

    match action {
        LootAction::Open => {
            let opening = engine.open_crate()?;
            print_json(&opening)?;
        }
        LootAction::List => {
            engine.tick()?;
            print_json(&engine.state().inventory)?;
        }
        LootAction::Equip { title } => {
            engine.equip_title(&title)?;
            println!("equipped {title}");
        }
    }
    Ok(())
}
