//! Config validation: schema checks with user-friendly error messages.

use crate::schema::PhotoCriticConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PhotoCriticConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_vision(config, &mut report);
    validate_generation(config, &mut report);
    validate_image(config, &mut report);
    validate_server(config, &mut report);
    report
}

fn validate_vision(config: &PhotoCriticConfig, report: &mut ValidationReport) {
    let vision = &config.vision;
    if vision.model().trim().is_empty() {
        report.error("vision.model", "Model name cannot be empty");
    }
    let base_url = vision.base_url();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        report.error("vision.baseUrl", format!("'{base_url}' is not an http(s) URL"));
    }
    if vision.timeout_secs() == 0 {
        report.error("vision.timeoutSecs", "timeoutSecs must be >= 1");
    }
    if vision.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
        report.warn("vision.apiKey", "apiKey is empty; falling back to environment");
    }
}

fn validate_generation(config: &PhotoCriticConfig, report: &mut ValidationReport) {
    let generation = &config.generation;
    let temperature = generation.temperature();
    if !(0.0..=2.0).contains(&temperature) {
        report.error(
            "generation.temperature",
            format!("temperature {temperature} must be within 0.0-2.0"),
        );
    }
    let top_p = generation.top_p();
    if !(0.0..=1.0).contains(&top_p) {
        report.error("generation.topP", format!("topP {top_p} must be within 0.0-1.0"));
    }
    if generation.top_k() == 0 {
        report.error("generation.topK", "topK must be >= 1");
    }
    if generation.max_output_tokens() == 0 {
        report.error("generation.maxOutputTokens", "maxOutputTokens must be >= 1");
    } else if generation.max_output_tokens() < 500 {
        report.warn(
            "generation.maxOutputTokens",
            "Fewer than 500 output tokens may truncate the six-section report",
        );
    }
}

fn validate_image(config: &PhotoCriticConfig, report: &mut ValidationReport) {
    if config.image.max_bytes() == 0 {
        report.error("image.maxBytes", "maxBytes must be > 0");
    }
}

fn validate_server(config: &PhotoCriticConfig, report: &mut ValidationReport) {
    let port = config.server.port();
    if port == 0 {
        report.error("server.port", "port must be > 0");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
}
