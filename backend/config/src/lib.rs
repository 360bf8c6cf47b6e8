//! `photocritic-config`: runtime configuration for photocritic.
//!
//! Provides:
//! - Typed config schema (vision service, generation, safety, parser, image, logging, server)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe logging/display
//! - Default value application
//! - Schema validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config_value, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{
    GenerationConfig, ImageConfig, LoggingConfig, ParserConfig, PhotoCriticConfig, SafetyConfig,
    SafetyThreshold, ServerConfig, VisionConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load, apply env substitution, apply defaults and validate a config file.
///
/// This is the main entry point for loading a config at runtime. A missing
/// file yields the defaults. Validation errors abort; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<PhotoCriticConfig> {
    let (config, warnings) = load_with_warnings(path).await?;
    for warning in &warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    Ok(config)
}

/// Same pipeline as [`load_and_prepare`], handing validation warnings back
/// to the caller instead of logging them.
///
/// Used before a log subscriber exists, where a `warn!` would go nowhere.
pub async fn load_with_warnings(
    path: &Path,
) -> Result<(PhotoCriticConfig, Vec<ConfigValidationError>)> {
    let value = load_config_value(path).await?;

    // Substitute ${VAR} env vars.
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config = prepare_value(value)?;

    let report = validate(&config);
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("Invalid config {}: {first}", path.display());
    }

    Ok((config, report.warnings))
}

/// Deserialize an already-substituted value and apply defaults.
pub fn prepare_value(value: serde_json::Value) -> Result<PhotoCriticConfig> {
    let config: PhotoCriticConfig =
        serde_json::from_value(value).context("Failed to deserialize config")?;
    Ok(apply_all_defaults(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("photocritic-config-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let cfg = load_and_prepare(&temp_path("config.yaml")).await.unwrap();
        assert_eq!(cfg.generation.temperature(), defaults::DEFAULT_TEMPERATURE);
        assert_eq!(cfg.vision.model(), defaults::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn invalid_values_abort_loading() {
        let path = temp_path("config.yaml");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "generation:\n  temperature: 3.5\n").await.unwrap();
        let err = load_and_prepare(&path).await.unwrap_err();
        assert!(err.to_string().contains("generation.temperature"));
    }

    #[tokio::test]
    async fn warnings_are_returned_not_fatal() {
        let path = temp_path("config.yaml");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "generation:\n  maxOutputTokens: 100\n").await.unwrap();
        let (cfg, warnings) = load_with_warnings(&path).await.unwrap();
        assert_eq!(cfg.generation.max_output_tokens(), 100);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "generation.maxOutputTokens");
    }

    #[tokio::test]
    async fn file_values_override_defaults() {
        let path = temp_path("config.yaml");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(
            &path,
            "generation:\n  topK: 20\nsafety:\n  harassment: block-none\nparser:\n  verifyHeadings: true\n",
        )
        .await
        .unwrap();
        let cfg = load_and_prepare(&path).await.unwrap();
        assert_eq!(cfg.generation.top_k(), 20);
        assert_eq!(cfg.generation.top_p(), defaults::DEFAULT_TOP_P);
        assert_eq!(cfg.safety.harassment(), SafetyThreshold::BlockNone);
        assert_eq!(cfg.safety.hate_speech(), SafetyThreshold::BlockMedium);
        assert!(cfg.parser.verify_headings());
    }
}
