//! Config file read/write with atomic backup rotation.

use crate::schema::PhotoCriticConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

/// Resolve the photocritic config directory.
/// Priority: `PHOTOCRITIC_CONFIG_DIR` env > `~/.photocritic/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PHOTOCRITIC_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".photocritic"),
        None => PathBuf::from(".photocritic"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load the config file as an untyped value, before env substitution.
///
/// Returns an empty object if the file doesn't exist (first run).
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    })
}

/// Write config to disk atomically (write to temp file, rename).
///
/// Creates a rolling backup of the previous config before overwriting.
pub async fn write_config(config: &PhotoCriticConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// Rotate backup files: config.yaml.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) -> Result<()> {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{}", i));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SafetyThreshold;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("photocritic-io-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE_NAME)
    }

    #[tokio::test]
    async fn write_then_load_preserves_values() {
        let path = temp_path();
        let mut cfg = PhotoCriticConfig::default();
        cfg.vision.api_key = Some("${GEMINI_API_KEY}".into());
        cfg.safety.harassment = Some(SafetyThreshold::BlockHigh);
        write_config(&cfg, &path).await.unwrap();

        let value = load_config_value(&path).await.unwrap();
        assert_eq!(value["vision"]["apiKey"], "${GEMINI_API_KEY}");
        assert_eq!(value["safety"]["harassment"], "block-high");
    }

    #[tokio::test]
    async fn second_write_creates_backup() {
        let path = temp_path();
        let cfg = PhotoCriticConfig::default();
        write_config(&cfg, &path).await.unwrap();
        write_config(&cfg, &path).await.unwrap();
        assert!(path.with_extension("yaml.bak.1").exists());
    }

    #[tokio::test]
    async fn empty_file_loads_as_empty_object() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, "").await.unwrap();
        let value = load_config_value(&path).await.unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }
}
