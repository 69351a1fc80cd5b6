use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "takt", version, about = "Takt habit timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Habit chains
    Chain {
        #[command(subcommand)]
        action: commands::chain::ChainAction,
    },
    /// Streaks and insights
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Recommend the next habit
    Suggest(commands::suggest::SuggestArgs),
    /// Handle a takt:// deep link
    Link {
        /// e.g. "takt://start-timer?name=water"
        url: String,
    },
    /// Built-in habit packs
    Pack {
        #[command(subcommand)]
        action: commands::pack::PackAction,
    },
    /// Daypart notifications
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAKT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Chain { action } => commands::chain::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Suggest(args) => commands::suggest::run(args),
        Commands::Link { url } => commands::link::run(&url),
        Commands::Pack { action } => commands::pack::run(action),
        Commands::Notify { action } => commands::notify::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
