use clap::{Parser, Subcommand};
use focusflow_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

const LOG_ENV: &str = "FOCUSFLOW_LOG";

#[derive(Parser)]
#[command(name = "focusflow", version, about = "FocusFlow focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Interval durations
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Focus contribution history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Remote endpoint sync
    Sync {
        #[command(subcommand)]
        action: commands::sync::SyncAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config_filter: Option<&str>) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let loaded = Config::load();
    init_tracing(loaded.as_ref().ok().map(|c| c.log_filter.as_str()));
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "using default configuration");
    }
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::History { action } => commands::history::run(action),
        Commands::Sync { action } => commands::sync::run(action, &config),
        // Editing must start from the file as written, never from defaults.
        Commands::Config { action } => commands::config::run(action, loaded),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
