//! # Forge Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! The `forge` binary:
//! - parses command-line arguments with Clap
//! - sets up logging from the verbosity flags (or `RUST_LOG`)
//! - routes execution to the command handlers in the `forge` library
//!
//! ## Examples
//!
//! ```bash
//! forge --help
//! forge -v blueprint list
//! forge -vv serve --port 9000
//! ```
//!
use clap::Parser;
use forge::commands;
use tracing_subscriber::{fmt, EnvFilter};

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "forge",
    about = "⚒️  Forge: blueprint-driven project generator",
    long_about = "Generate projects from declarative blueprints, on the command line\n\
                  or through an HTTP/WebSocket service.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Inspect blueprints and generate projects.
    #[command(alias = "b")]
    Blueprint(commands::blueprint::BlueprintArgs),
    /// Run the HTTP/WebSocket generation service.
    #[command(alias = "s")]
    Serve(commands::srv::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Blueprint(args) => commands::blueprint::handle_blueprint(args).await,
        Commands::Serve(args) => commands::srv::handle_serve(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
