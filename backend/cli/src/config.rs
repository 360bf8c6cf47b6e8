//! Config resolution and the `config` subcommands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use photocritic_config::{
    apply_all_defaults, collect_redacted_paths, config_dir, config_file_path, load_with_warnings,
    redact, write_config, PhotoCriticConfig,
};
use photocritic_logging::init_logger;

use crate::terminal_output::{note_info, note_success, note_warn};

/// Level used by commands that run before or without a config file.
const BOOTSTRAP_LOG_LEVEL: &str = "warn";

/// `--config` wins, otherwise `$PHOTOCRITIC_CONFIG_DIR/config.yaml` or
/// `~/.photocritic/config.yaml`.
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path(&config_dir()),
    }
}

/// Load the runtime config and start logging with its settings.
///
/// Validation warnings are shown to the user directly, since they are found
/// before the subscriber exists.
pub async fn load(path: &Path, verbose: bool) -> Result<PhotoCriticConfig> {
    let (config, warnings) = load_reporting(path).await?;
    let level = if verbose { "debug" } else { config.logging.level() };
    init_logger(config.logging.dir.as_deref().map(Path::new), level);
    for warning in &warnings {
        note_warn(warning);
    }
    Ok(config)
}

/// Load the config and render its validation warnings as one line each.
async fn load_reporting(path: &Path) -> Result<(PhotoCriticConfig, Vec<String>)> {
    let (config, warnings) = load_with_warnings(path).await?;
    let lines = warnings
        .iter()
        .map(|w| format!("Config {}: {}", w.path, w.message))
        .collect();
    Ok((config, lines))
}

/// Print the effective config with secrets masked.
pub async fn show(path: &Path) -> Result<ExitCode> {
    let config = load(path, false).await?;
    let value = serde_json::to_value(&config).context("Failed to serialize config")?;
    let yaml = serde_yaml::to_string(&redact(&value)).context("Failed to render config")?;
    note_info(&format!("Config file: {}", path.display()));
    let masked = collect_redacted_paths(&value);
    if !masked.is_empty() {
        note_info(&format!("Masked: {}", masked.join(", ")));
    }
    print!("{yaml}");
    Ok(ExitCode::SUCCESS)
}

/// Start logging for commands that never load a config file.
pub fn init_bootstrap_logger() {
    init_logger(None, BOOTSTRAP_LOG_LEVEL);
}

/// Write a config file populated with defaults.
///
/// The API key is left out; it is read from the environment at runtime.
pub async fn init(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {}; pass --force to overwrite",
            path.display()
        );
    }
    init_bootstrap_logger();
    let config = apply_all_defaults(PhotoCriticConfig::default());
    write_config(&config, path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("photocritic-cli-{}", uuid::Uuid::new_v4()))
            .join("config.yaml")
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/custom.yaml");
        assert_eq!(resolve_path(Some(path)), path);
        assert!(resolve_path(None).ends_with("config.yaml"));
    }

    #[tokio::test]
    async fn config_warnings_reach_the_user() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "vision:\n  apiKey: \"\"\ngeneration:\n  maxOutputTokens: 100\n")
            .await
            .unwrap();

        let (config, lines) = load_reporting(&path).await.unwrap();
        assert_eq!(config.generation.max_output_tokens(), 100);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.starts_with("Config vision.apiKey:")));
        assert!(lines.iter().any(|l| l.starts_with("Config generation.maxOutputTokens:")));
    }

    #[tokio::test]
    async fn init_writes_loadable_defaults_once() {
        let path = temp_path();
        init(&path, false).await.unwrap();

        let (config, _) = load_reporting(&path).await.unwrap();
        assert_eq!(config.vision.model(), "gemini-1.5-flash");
        assert_eq!(config.generation.top_k(), 40);
        assert!(config.vision.api_key.is_none());

        assert!(init(&path, false).await.is_err());
        init(&path, true).await.unwrap();
    }
}
