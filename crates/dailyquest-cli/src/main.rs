use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dailyquest", version, about = "Dailyquest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Level, streak, penalty and challenge overview
    Status,
    /// Daily log: quests, metrics, closing
    Day {
        #[command(subcommand)]
        action: commands::day::DayAction,
    },
    /// Attribute points
    Stat {
        #[command(subcommand)]
        action: commands::stat::StatAction,
    },
    /// Crates, badges and titles
    Loot {
        #[command(subcommand)]
        action: commands::loot::LootAction,
    },
    /// Weekly dungeon challenge
    Weekly {
        #[command(subcommand)]
        action: commands::weekly::WeeklyAction,
    },
    /// Monthly boss
    Boss {
        #[command(subcommand)]
        action: commands::boss::BossAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status => commands::status::run(),
        Commands::Day { action } => commands::day::run(action),
        Commands::Stat { action } => commands::stat::run(action),
        Commands::Loot { action } => commands::loot::run(action),
        Commands::Weekly { action } => commands::weekly::run(action),
        Commands::Boss { action } => commands::boss::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
