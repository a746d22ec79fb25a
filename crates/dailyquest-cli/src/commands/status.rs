use super::{open_engine, print_json};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = open_engine()?;
    let snapshot = engine.status()?;
    print_json(&snapshot)
}
