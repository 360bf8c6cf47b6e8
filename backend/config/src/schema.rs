//! photocritic configuration schema.
//!
//! Every leaf is optional in the file; getters fall back to the values in
//! [`crate::defaults`].

use serde::{Deserialize, Serialize};

use crate::defaults::*;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for photocritic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoCriticConfig {
    /// Vision-completion service connection
    #[serde(default)]
    pub vision: VisionConfig,

    /// Model sampling parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Per-category content-safety thresholds
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Reply parser behaviour
    #[serde(default)]
    pub parser: ParserConfig,

    /// Accepted image limits
    #[serde(default)]
    pub image: ImageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,
}

// ---------------------------------------------------------------------------
// Vision service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionConfig {
    /// Usually `${GEMINI_API_KEY}`; never commit a literal key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl VisionConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// The credential from config, else from the process environment.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::api_key`] with an injectable env lookup.
    pub fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Some(key.trim().to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn top_p(&self) -> f32 {
        self.top_p.unwrap_or(DEFAULT_TOP_P)
    }

    pub fn top_k(&self) -> u32 {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
    }
}

// ---------------------------------------------------------------------------
// Safety
// ---------------------------------------------------------------------------

/// How aggressively the service blocks a harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyThreshold {
    BlockLow,
    BlockMedium,
    BlockHigh,
    BlockNone,
}

impl SafetyThreshold {
    /// Wire value understood by the Gemini API.
    pub fn api_value(&self) -> &'static str {
        match self {
            SafetyThreshold::BlockLow => "BLOCK_LOW_AND_ABOVE",
            SafetyThreshold::BlockMedium => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyThreshold::BlockHigh => "BLOCK_ONLY_HIGH",
            SafetyThreshold::BlockNone => "BLOCK_NONE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harassment: Option<SafetyThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hate_speech: Option<SafetyThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sexually_explicit: Option<SafetyThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangerous_content: Option<SafetyThreshold>,
}

impl SafetyConfig {
    pub fn harassment(&self) -> SafetyThreshold {
        self.harassment.unwrap_or(DEFAULT_SAFETY_THRESHOLD)
    }

    pub fn hate_speech(&self) -> SafetyThreshold {
        self.hate_speech.unwrap_or(DEFAULT_SAFETY_THRESHOLD)
    }

    pub fn sexually_explicit(&self) -> SafetyThreshold {
        self.sexually_explicit.unwrap_or(DEFAULT_SAFETY_THRESHOLD)
    }

    pub fn dangerous_content(&self) -> SafetyThreshold {
        self.dangerous_content.unwrap_or(DEFAULT_SAFETY_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Parser / image / logging / server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    /// Require each heading to name the criterion expected at its position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_headings: Option<bool>,
}

impl ParserConfig {
    pub fn verify_headings(&self) -> bool {
        self.verify_headings.unwrap_or(DEFAULT_VERIFY_HEADINGS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<usize>,
}

impl ImageConfig {
    pub fn max_bytes(&self) -> usize {
        self.max_bytes.unwrap_or(DEFAULT_IMAGE_MAX_BYTES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling NDJSON logs; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServerConfig {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn deserializes_camel_case_yaml() {
        let yaml = "vision:\n  model: gemini-2.0-flash\n  timeoutSecs: 30\ngeneration:\n  maxOutputTokens: 1024\nsafety:\n  dangerousContent: block-high\n";
        let cfg: PhotoCriticConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.vision.model(), "gemini-2.0-flash");
        assert_eq!(cfg.vision.timeout_secs(), 30);
        assert_eq!(cfg.generation.max_output_tokens(), 1024);
        assert_eq!(cfg.safety.dangerous_content(), SafetyThreshold::BlockHigh);
        assert_eq!(cfg.safety.dangerous_content().api_value(), "BLOCK_ONLY_HIGH");
    }

    #[test]
    fn rejects_unknown_threshold() {
        let yaml = "safety:\n  harassment: block-everything\n";
        assert!(serde_yaml::from_str::<PhotoCriticConfig>(yaml).is_err());
    }

    #[test]
    fn api_key_prefers_config_then_env() {
        let env: HashMap<&str, &str> =
            [("PHOTOCRITIC_API_KEY", ""), ("GEMINI_API_KEY", "from-env")].into();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let mut vision = VisionConfig::default();
        assert_eq!(vision.api_key_with(lookup).as_deref(), Some("from-env"));

        vision.api_key = Some("from-config".into());
        assert_eq!(vision.api_key_with(lookup).as_deref(), Some("from-config"));

        assert_eq!(VisionConfig::default().api_key_with(|_| None), None);
    }
}
