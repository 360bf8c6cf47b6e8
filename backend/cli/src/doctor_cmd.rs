//! CLI Doctor Command
//!
//! Checks that an analysis could run: config parses and validates, a
//! credential is available, and the model settings look sane.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use photocritic_config::{
    collect_referenced_vars, defaults::API_KEY_ENV_VARS, load_config_value, prepare_value,
    resolve_env_vars, validate, PhotoCriticConfig,
};
use photocritic_understanding::ReportParser;

/// Executes the full doctor diagnosis.
pub async fn run(path: &Path) -> Result<ExitCode> {
    println!("\n🔍 Running photocritic doctor...\n");

    let config = check_config(path).await;
    let is_ok = match &config {
        Some(config) => {
            let key_ok = check_credential(config);
            check_model(config);
            key_ok
        }
        None => false,
    };

    println!();
    if is_ok {
        println!("✅ All checks passed! photocritic is ready.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
        Ok(ExitCode::FAILURE)
    }
}

async fn check_config(path: &Path) -> Option<PhotoCriticConfig> {
    println!("Checking Config ({}):", path.display());

    if !path.exists() {
        println!("  🟡 No config file; using defaults");
    }
    let config = match load_unvalidated(path).await {
        Ok(config) => config,
        Err(e) => {
            println!("  🔴 {e:#}");
            return None;
        }
    };

    let report = validate(&config);
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("  🔴 {}: {}", error.path, error.message);
    }
    if !report.is_valid() {
        return None;
    }
    println!("  🟢 Config is valid");
    Some(config)
}

async fn load_unvalidated(path: &Path) -> Result<PhotoCriticConfig> {
    let value = load_config_value(path).await?;
    let referenced = collect_referenced_vars(&value);
    if !referenced.is_empty() {
        println!("  🟢 References env vars: {}", referenced.join(", "));
    }
    let value = resolve_env_vars(&value)?;
    prepare_value(value)
}

fn check_credential(config: &PhotoCriticConfig) -> bool {
    println!("Checking API Credential:");

    let from_file = config
        .vision
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if from_file {
        println!("  🟢 vision.apiKey is set in config");
        return true;
    }
    for var in API_KEY_ENV_VARS {
        if std::env::var(var).is_ok_and(|v| !v.trim().is_empty()) {
            println!("  🟢 {var} is set");
            return true;
        }
    }
    println!(
        "  🔴 No API key (set vision.apiKey or one of {})",
        API_KEY_ENV_VARS.join(", ")
    );
    false
}

fn check_model(config: &PhotoCriticConfig) {
    println!("Checking Vision Model:");
    println!("  🟢 model {} at {}", config.vision.model(), config.vision.base_url());
    println!(
        "  🟢 timeout {}s, images up to {} bytes",
        config.vision.timeout_secs(),
        config.image.max_bytes()
    );
    println!(
        "  🟢 heading policy {:?}",
        ReportParser::from_config(config).policy()
    );
}
