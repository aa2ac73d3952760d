use breakwise_core::Config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "breakwise", version, about = "Break reminders that adapt to you")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder host (JSON commands on stdin, JSON events on stdout)
    Run(commands::run::RunArgs),
    /// User settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Break statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Settings and statistics summary
    Status,
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_logging(&config.logging.level);

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Stats { action } => commands::stats::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Status => commands::status::run(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays a clean JSON stream. `RUST_LOG` wins over
/// the configured level.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
