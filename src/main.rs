//! bdfext command-line interface
//!
//! Runs the reference channel with the semi-implicit BDF/EXT controller and
//! prints scheme information.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Semi-implicit BDF/EXT integrator for forced channel flow
#[derive(Parser)]
#[command(name = "bdfext")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Semi-implicit BDF/EXT time integration for actuated, noise-forced flow", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the channel simulation
    Run(commands::run::RunArgs),
    /// Show coefficient tables and the stabilization registry
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
