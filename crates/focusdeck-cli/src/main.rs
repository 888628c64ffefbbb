use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "focusdeck", version, about = "Focusdeck pomodoro timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live focus session in the foreground
    Run(commands::run::RunArgs),
    /// Recently completed work sessions
    Sessions {
        /// Maximum number of sessions to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Points, rank and badges
    Progress {
        /// Also print the most recent point credits
        #[arg(long)]
        history: bool,
        #[command(subcommand)]
        action: Option<commands::progress::ProgressAction>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    // Logs go to stderr; stdout carries JSON output only.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("FOCUSDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Sessions { limit } => commands::sessions::run(limit),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Progress { history, action } => commands::progress::run(history, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
