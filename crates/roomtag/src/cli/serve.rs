//! The `roomtag serve` command: run the REST API.

use clap::Args;
use roomtag_core::{Classifier, Config, ImageFetcher};
use std::sync::Arc;

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let classifier = Classifier::from_config(&config)?;
    let state = AppState {
        classifier: Arc::new(classifier),
        fetcher: ImageFetcher::new(&config.download),
    };

    server::run(state, &config.server_addr()).await
}
