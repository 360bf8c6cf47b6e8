//! Config defaults: applies default values to parsed config.

use crate::schema::{PhotoCriticConfig, SafetyThreshold};

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout for one completion call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_TEMPERATURE: f32 = 0.9;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 5000;

pub const DEFAULT_SAFETY_THRESHOLD: SafetyThreshold = SafetyThreshold::BlockMedium;

pub const DEFAULT_VERIFY_HEADINGS: bool = false;

/// Inline image payload limit of the service (20 MiB).
pub const DEFAULT_IMAGE_MAX_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variables consulted, in order, when `vision.apiKey` is unset.
pub const API_KEY_ENV_VARS: &[&str] = &["PHOTOCRITIC_API_KEY", "GEMINI_API_KEY"];

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PhotoCriticConfig) -> PhotoCriticConfig {
    let config = apply_vision_defaults(config);
    let config = apply_generation_defaults(config);
    let config = apply_safety_defaults(config);
    apply_misc_defaults(config)
}

fn apply_vision_defaults(mut config: PhotoCriticConfig) -> PhotoCriticConfig {
    let vision = &mut config.vision;
    vision.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    vision.base_url.get_or_insert_with(|| DEFAULT_BASE_URL.to_string());
    vision.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

fn apply_generation_defaults(mut config: PhotoCriticConfig) -> PhotoCriticConfig {
    let generation = &mut config.generation;
    generation.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    generation.top_p.get_or_insert(DEFAULT_TOP_P);
    generation.top_k.get_or_insert(DEFAULT_TOP_K);
    generation.max_output_tokens.get_or_insert(DEFAULT_MAX_OUTPUT_TOKENS);
    config
}

fn apply_safety_defaults(mut config: PhotoCriticConfig) -> PhotoCriticConfig {
    let safety = &mut config.safety;
    for threshold in [
        &mut safety.harassment,
        &mut safety.hate_speech,
        &mut safety.sexually_explicit,
        &mut safety.dangerous_content,
    ] {
        threshold.get_or_insert(DEFAULT_SAFETY_THRESHOLD);
    }
    config
}

/// Parser, image, logging and server defaults.
fn apply_misc_defaults(mut config: PhotoCriticConfig) -> PhotoCriticConfig {
    config.parser.verify_headings.get_or_insert(DEFAULT_VERIFY_HEADINGS);
    config.image.max_bytes.get_or_insert(DEFAULT_IMAGE_MAX_BYTES);
    config
        .logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config.server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    config.server.port.get_or_insert(DEFAULT_PORT);
    config
}
