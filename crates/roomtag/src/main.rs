//! Roomtag CLI - classify real-estate listing photos with a hosted vision model.
//!
//! Roomtag runs either as a REST service or as an interactive terminal
//! front end. Both call the same classifier; they are separate commands and
//! never share a process.
//!
//! # Usage
//!
//! ```bash
//! # Serve the REST API on 0.0.0.0:8000
//! roomtag serve
//!
//! # Guided classification in the terminal
//! roomtag interactive
//!
//! # One-shot classification of a file or URL
//! roomtag classify ./photos/kitchen.jpg
//!
//! # View configuration
//! roomtag config show
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// Roomtag - classify real-estate listing photos.
#[derive(Parser, Debug)]
#[command(name = "roomtag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ROOMTAG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the REST classification API
    Serve(cli::serve::ServeArgs),

    /// Classify images through a guided terminal interface
    Interactive,

    /// Classify a single image file or URL and print the result as JSON
    Classify(cli::classify::ClassifyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => roomtag_core::Config::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => match roomtag_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `roomtag config path`."
                );
                roomtag_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Roomtag v{}", roomtag_core::VERSION);

    match cli.command {
        Some(Commands::Serve(args)) => cli::serve::execute(args, &config).await,
        Some(Commands::Interactive) => cli::interactive::run(&config).await,
        Some(Commands::Classify(args)) => cli::classify::execute(args, &config).await,
        Some(Commands::Config(args)) => cli::config::execute(args, &config, cli.config).await,
        None if std::io::stdin().is_terminal() && std::io::stderr().is_terminal() => {
            cli::interactive::run(&config).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
