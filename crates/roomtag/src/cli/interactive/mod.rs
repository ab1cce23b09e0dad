//! Interactive CLI mode: a menu-driven front end for bare `roomtag`
//! invocation on a TTY (or `roomtag interactive`).
//!
//! The menu mirrors the two input tabs of the web demo, "Upload Image" and
//! "Image URL", and uses the same `Classifier` as the REST service.

pub mod classify;
pub mod theme;

use console::Style;
use dialoguer::Select;
use roomtag_core::{Classifier, Config, ImageFetcher};

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
///
/// Wraps `interact_text()` calls, which lack an `_opt` variant, so interrupts
/// exit the current flow cleanly.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Main menu options presented to the user.
const MENU_ITEMS: &[&str] = &["Upload Image", "Image URL", "Show configuration", "Exit"];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();

    let theme = theme::roomtag_theme();
    let fetcher = ImageFetcher::new(&config.download);

    // A missing API key shouldn't lock the user out of the config viewer.
    let classifier = Classifier::from_config(config).map_err(|e| e.to_string());
    if let Err(e) = &classifier {
        show_setup_error(e);
    }

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match (selection, &classifier) {
            (Some(0), Ok(classifier)) => classify::guided_upload(classifier).await?,
            (Some(1), Ok(classifier)) => classify::guided_url(classifier, &fetcher).await?,
            (Some(0 | 1), Err(e)) => show_setup_error(e),
            (Some(2), _) => show_config(config)?,
            (Some(3), _) | (None, _) => break, // Exit or Ctrl+C / Esc
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn show_setup_error(message: &str) {
    let red = Style::new().for_stderr().red();
    let dim = Style::new().for_stderr().dim();
    eprintln!("  {} {}", red.apply_to("✗"), red.apply_to(message));
    eprintln!(
        "  {}",
        dim.apply_to("Classification is unavailable until the Gemini credentials are configured.")
    );
    eprintln!();
}

/// Interactive config viewer.
fn show_config(config: &Config) -> anyhow::Result<()> {
    let theme = theme::roomtag_theme();
    let dim = Style::new().for_stderr().dim();
    let cyan = Style::new().for_stderr().cyan();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", cyan.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };

        eprintln!(
            "    {:<20} {} {}",
            label.apply_to("Config file:"),
            config_path.display(),
            dim.apply_to(path_note)
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Model:"),
            config.gemini.model
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Endpoint:"),
            config.gemini.endpoint
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("API key:"),
            credential_status(&config.gemini.api_key)
        );
        eprintln!(
            "    {:<20} {} ms, {} retries",
            label.apply_to("Classify timeout:"),
            config.classifier.timeout_ms,
            config.classifier.retry_attempts
        );
        eprintln!(
            "    {:<20} {} ms",
            label.apply_to("Download timeout:"),
            config.download.timeout_ms
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Staging dir:"),
            config
                .staging_dir()
                .unwrap_or_else(std::env::temp_dir)
                .display()
        );
        eprintln!(
            "    {:<20} {}",
            label.apply_to("Log level:"),
            config.logging.level
        );
        eprintln!();

        let items = &["View full config (TOML)", "Show config file path", "Back"];

        let selection = Select::with_theme(&theme)
            .with_prompt("Configuration")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => match config.to_toml() {
                Ok(toml) => {
                    eprintln!();
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!("{toml}");
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!();
                }
                Err(e) => {
                    let err = Style::new().for_stderr().red();
                    eprintln!("  {} Failed to serialize config: {e}", err.apply_to("✗"));
                    eprintln!();
                }
            },
            Some(1) => {
                eprintln!();
                eprintln!("  {}", Config::default_path().display());
                eprintln!();
            }
            Some(2) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// Whether the configured key resolves, without echoing it.
fn credential_status(raw: &str) -> &'static str {
    match roomtag_core::config::resolve_env_var(raw) {
        Some(_) => "set",
        None => "missing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_status() {
        assert_eq!(credential_status("literal-key"), "set");
        assert_eq!(credential_status("${ROOMTAG_TEST_UNSET_KEY_9F3A}"), "missing");
        assert_eq!(credential_status(""), "missing");
    }

    #[test]
    fn test_handle_interrupt() {
        let interrupted: dialoguer::Result<u8> = Err(dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "ctrl-c",
        )));
        assert!(handle_interrupt(interrupted).unwrap().is_none());
        assert_eq!(handle_interrupt(Ok(3u8)).unwrap(), Some(3));
    }
}
