//! Guided classification flow.
//!
//! Pick an image (local file or URL) → preview → confirm → classify with a
//! spinner → show the label. Failures are shown inline and return to the
//! menu; they never end the session.

use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use roomtag_core::{Classifier, ImageFetcher, ImagePayload, ImagePreview};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::theme::roomtag_theme;

/// Extensions accepted by the upload prompt.
const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// "Upload Image": read a local jpg/jpeg/png and classify it.
pub async fn guided_upload(classifier: &Classifier) -> anyhow::Result<()> {
    let theme = roomtag_theme();

    let image = loop {
        let Some(raw_path) = super::handle_interrupt(
            Input::<String>::with_theme(&theme)
                .with_prompt("Path to image (jpg, jpeg, png)")
                .interact_text(),
        )?
        else {
            return Ok(());
        };

        let path = PathBuf::from(shellexpand::tilde(raw_path.trim()).into_owned());

        if !has_upload_extension(&path) {
            warn(&format!(
                "Unsupported file type: {} (expected {})",
                path.display(),
                UPLOAD_EXTENSIONS.join(", ")
            ));
            continue;
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => break ImagePayload::new(bytes),
            Err(e) => {
                warn(&format!("Cannot read {}: {e}", path.display()));
                continue;
            }
        }
    };

    confirm_and_classify(&theme, classifier, &image).await
}

/// "Image URL": download the image, then classify it.
pub async fn guided_url(classifier: &Classifier, fetcher: &ImageFetcher) -> anyhow::Result<()> {
    let theme = roomtag_theme();

    let Some(url) = super::handle_interrupt(
        Input::<String>::with_theme(&theme)
            .with_prompt("Image URL")
            .interact_text(),
    )?
    else {
        return Ok(());
    };

    let spinner = spinner("Downloading image...");
    let fetched = fetcher.fetch(url.trim()).await;
    spinner.finish_and_clear();

    match fetched {
        Ok(image) => confirm_and_classify(&theme, classifier, &image).await,
        Err(e) => {
            show_error(&e.to_string());
            Ok(())
        }
    }
}

async fn confirm_and_classify(
    theme: &ColorfulTheme,
    classifier: &Classifier,
    image: &ImagePayload,
) -> anyhow::Result<()> {
    let dim = Style::new().for_stderr().dim();
    eprintln!("  {}", dim.apply_to(describe_preview(&image.preview())));

    let confirm = Confirm::with_theme(theme)
        .with_prompt("Classify this image?")
        .default(true)
        .interact_opt()?;
    if confirm != Some(true) {
        return Ok(());
    }

    let spinner = spinner("Classifying image...");
    let result = classifier.classify(image).await;
    spinner.finish_and_clear();

    match result {
        Ok(classification) => {
            let green = Style::new().for_stderr().green().bold();
            eprintln!();
            eprintln!(
                "  {}",
                green.apply_to(format!("Classification result: {classification}"))
            );
            if !classification.is_real_estate() {
                eprintln!("  {}", dim.apply_to("Not a real-estate image."));
            }
            eprintln!();
        }
        Err(e) => {
            tracing::debug!(stage = e.stage(), "Interactive classification failed: {e}");
            show_error(&format!("Error processing image: {e}"));
        }
    }

    Ok(())
}

fn has_upload_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            UPLOAD_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// One-line summary such as `PNG · 1024×768 · 215.3 KB`.
fn describe_preview(preview: &ImagePreview) -> String {
    let format = preview
        .mime_type
        .strip_prefix("image/")
        .unwrap_or(preview.mime_type)
        .to_uppercase();
    let dimensions = match preview.dimensions {
        Some((w, h)) => format!("{w}×{h}"),
        None => "unknown size".to_string(),
    };
    format!(
        "{format} · {dimensions} · {}",
        format_bytes(preview.size_bytes)
    )
}

fn format_bytes(bytes: usize) -> String {
    match bytes {
        b if b >= 1_000_000 => format!("{:.1} MB", b as f64 / 1_000_000.0),
        b if b >= 1_000 => format!("{:.1} KB", b as f64 / 1_000.0),
        b => format!("{b} B"),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn warn(message: &str) {
    let yellow = Style::new().for_stderr().yellow();
    eprintln!("  {}", yellow.apply_to(message));
}

fn show_error(message: &str) {
    let red = Style::new().for_stderr().red();
    eprintln!();
    eprintln!("  {} {}", red.apply_to("✗"), red.apply_to(message));
    eprintln!();
}
