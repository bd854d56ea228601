//! cmdmock - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cmdmock::cli::{Cli, Commands};
use cmdmock::{Config, Pacing, ProcessGuard};

/// Environment variable holding the log filter, e.g. `CMDMOCK_LOG=debug`.
const LOG_ENV: &str = "CMDMOCK_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so they never mix with replayed stdout.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load()?;
    let store = commands::open_store(cli.output_dir.as_deref(), &config);

    let guard = ProcessGuard::default();
    guard.register_signal_handlers();

    match cli.command {
        Commands::Record {
            name,
            quiet,
            force,
            command,
        } => commands::record::handle(&store, &config, &guard, &name, quiet, force, &command),
        Commands::Replay { name, pacing } => {
            let pacing = pacing.map(Pacing::from).unwrap_or(config.replay.pacing);
            commands::replay::handle(&store, &guard, &name, pacing)
        }
    }
}
