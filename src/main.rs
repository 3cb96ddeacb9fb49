//! Trimline CLI
//!
//! Command-line interface for the Trimline timeline engine.

use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use trimline::cli::{commands, Cli, Commands};
use trimline::config::EngineConfig;
use trimline::Result;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Trimline v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = run(cli) {
        error!("{} [{}]", err, err.error_code());
        for suggestion in err.recovery_suggestions() {
            eprintln!("  hint: {}", suggestion);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Trimline v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &EngineConfig) -> Result<()> {
    match cmd {
        Commands::Snap { time, fps } => commands::snap(time, fps),
        Commands::Nudge { time, frames, fps } => commands::nudge(time, frames, fps, config),
        Commands::Cut { input, position } => commands::cut(&input, position, config),
        Commands::Ripple {
            clips,
            change_point,
            delta,
            mode,
            seed,
        } => commands::ripple(&clips, change_point, delta, mode, seed, config),
        Commands::Markers { analysis, filter } => commands::markers(&analysis, filter),
        Commands::Recognize { markers } => commands::recognize(&markers),
    }
}
