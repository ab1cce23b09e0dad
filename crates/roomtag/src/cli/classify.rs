//! The `roomtag classify` command: classify one file or URL.

use clap::Args;
use roomtag_core::{Classifier, Config, ImageFetcher, ImageSource};
use std::path::PathBuf;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file path or http(s) URL
    #[arg(required = true)]
    pub input: String,
}

/// Execute the classify command. Prints `{"classification": ...}` to stdout.
pub async fn execute(args: ClassifyArgs, config: &Config) -> anyhow::Result<()> {
    let classifier = Classifier::from_config(config)?;
    let fetcher = ImageFetcher::new(&config.download);

    let source = resolve_input(&args.input).await?;
    let image = fetcher.load(source).await?;
    let classification = classifier.classify(&image).await?;

    println!(
        "{}",
        serde_json::json!({ "classification": classification })
    );
    Ok(())
}

/// URLs are fetched later; anything else is read as a local file.
async fn resolve_input(input: &str) -> anyhow::Result<ImageSource> {
    if is_url(input) {
        return Ok(ImageSource::Url(input.to_string()));
    }
    let path = PathBuf::from(shellexpand::tilde(input).into_owned());
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    Ok(ImageSource::Upload(bytes))
}

pub(crate) fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}
