//! Default command: tee standard input into the destinations.

use anyhow::{Context, Result};
use tracing::info;

use config_loader::{ConfigLoader, TeeSettings};
use fanout::SessionConfig;

use crate::cli::Cli;

/// Load the settings file and apply command-line overrides
///
/// Flags and `MTEE_*` variables win over the file, the file wins over defaults.
pub fn resolve_settings(args: &Cli) -> Result<TeeSettings> {
    let mut settings = match &args.config {
        Some(path) => ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load default config")?,
    };

    if args.append {
        settings.append = true;
    }
    if let Some(size) = args.file_buffer_size {
        settings.file_buffer_size = size;
    }
    if let Some(size) = args.console_buffer_size {
        settings.console_buffer_size = size;
    }
    match args.metrics_port {
        Some(0) => settings.metrics_port = None,
        Some(port) => settings.metrics_port = Some(port),
        None => {}
    }

    config_loader::validate(&settings).context("Invalid settings")?;
    Ok(settings)
}

/// Filter used when `RUST_LOG` is unset
pub fn log_level(args: &Cli, settings: &TeeSettings) -> String {
    if args.quiet {
        return "error".to_string();
    }
    match args.verbose {
        0 => settings
            .log_level
            .clone()
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Execute the tee
pub async fn run_tee(args: &Cli, settings: &TeeSettings) -> Result<()> {
    let config = SessionConfig::from_settings(args.destinations.clone(), settings);

    info!(
        destinations = config.destinations.len(),
        append = config.append,
        file_buffer_size = config.file_buffer_size,
        console_buffer_size = config.console_buffer_size,
        "Starting tee"
    );

    let stats = fanout::run(&config).await.context("mtee failed")?;

    if args.stats {
        eprint!("{stats}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_settings_used_without_flags() {
        let file = settings_file("append = true\nfile_buffer_size = 128\n");
        let path = file.path().to_str().unwrap();
        let args = Cli::try_parse_from(["mtee", "-c", path]).unwrap();

        let settings = resolve_settings(&args).unwrap();
        assert!(settings.append);
        assert_eq!(settings.file_buffer_size, 128);
    }

    #[test]
    fn test_flags_override_file() {
        let file = settings_file("file_buffer_size = 128\nmetrics_port = 9100\n");
        let path = file.path().to_str().unwrap();
        let args = Cli::try_parse_from([
            "mtee",
            "-c",
            path,
            "--file-buffer-size",
            "64",
            "--console-buffer-size",
            "8",
            "--metrics-port",
            "0",
        ])
        .unwrap();

        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.file_buffer_size, 64);
        assert_eq!(settings.console_buffer_size, 8);
        assert_eq!(settings.metrics_port, None);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let file = settings_file("");
        let path = file.path().to_str().unwrap();
        let args =
            Cli::try_parse_from(["mtee", "-c", path, "--file-buffer-size", "0"]).unwrap();

        assert!(resolve_settings(&args).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Cli::try_parse_from(["mtee", "-c", "/nonexistent/mtee.toml"]).unwrap();
        let err = resolve_settings(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"), "got: {err}");
    }

    #[test]
    fn test_log_level_selection() {
        let settings = TeeSettings {
            log_level: Some("mtee=debug".to_string()),
            ..TeeSettings::default()
        };

        let quiet = Cli::try_parse_from(["mtee", "-q"]).unwrap();
        assert_eq!(log_level(&quiet, &settings), "error");

        let plain = Cli::try_parse_from(["mtee"]).unwrap();
        assert_eq!(log_level(&plain, &settings), "mtee=debug");
        assert_eq!(log_level(&plain, &TeeSettings::default()), "warn");

        let verbose = Cli::try_parse_from(["mtee", "-vvv"]).unwrap();
        assert_eq!(log_level(&verbose, &settings), "trace");
    }
}
