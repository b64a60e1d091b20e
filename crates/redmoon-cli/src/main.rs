use clap::{Parser, Subcommand};
use redmoon_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "redmoon-cli", version, about = "Red Moon scheduler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Inspect the daily on/off schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Foreground app classification and monitoring
    Monitor {
        #[command(subcommand)]
        action: commands::monitor::MonitorAction,
    },
    /// Run the alarm scheduler in the foreground
    Run(commands::run::RunArgs),
}

fn init_tracing() {
    // RUST_LOG wins; otherwise follow the configured level.
    let level = Config::path()
        .ok()
        .filter(|p| p.exists())
        .and_then(|p| Config::load_from(&p).ok())
        .map(|c| c.log.level)
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("redmoon={level}"))),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Monitor { action } => commands::monitor::run(action),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
