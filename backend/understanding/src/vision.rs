/// Vision completion via the Gemini `generateContent` REST API.
///
/// One POST per call carrying the prompt, the inline base64 image, sampling
/// parameters and safety thresholds. Failures are classified into
/// [`CompletionError`] kinds and never retried.
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use photocritic_config::{GenerationConfig, PhotoCriticConfig, SafetyConfig};
use photocritic_core::{CompletionError, ImageInput, VisionCompletion};
use photocritic_logging::redact_sensitive_data;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons that mean the service withheld the answer on policy grounds.
const POLICY_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

pub struct GeminiVisionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationParams,
    safety: Vec<SafetySetting>,
}

impl GeminiVisionClient {
    /// Build a client from config; fails when no credential is available.
    pub fn from_config(config: &PhotoCriticConfig) -> Result<Self, CompletionError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_config`] with an injectable env lookup for the key.
    pub fn from_config_with(
        config: &PhotoCriticConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CompletionError> {
        let api_key = config.vision.api_key_with(env).ok_or_else(|| {
            CompletionError::auth(
                "no API key configured; set vision.apiKey or the GEMINI_API_KEY environment variable",
            )
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.vision.timeout_secs()))
            .build()
            .map_err(|e| CompletionError::transport("failed to build HTTP client").with_source(e))?;

        Ok(Self {
            client,
            api_key,
            model: config.vision.model().to_string(),
            base_url: config.vision.base_url().trim_end_matches('/').to_string(),
            generation: GenerationParams::from(&config.generation),
            safety: safety_settings(&config.safety),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request<'a>(&'a self, prompt: &'a str, mime_type: &'a str, data: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData { mime_type, data },
                    },
                ],
            }],
            generation_config: &self.generation,
            safety_settings: &self.safety,
        }
    }
}

#[async_trait]
impl VisionCompletion for GeminiVisionClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, prompt: &str, image: &ImageInput) -> Result<String, CompletionError> {
        let encoded = STANDARD.encode(&image.data);
        let body = self.build_request(prompt, image.mime_type(), &encoded);

        info!(model = %self.model, mime = image.mime_type(), bytes = image.len(), "[Vision] Describing image via Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() { "request timed out" } else { "request failed" };
                let e = e.without_url();
                CompletionError::transport(format!("{what}: {}", redact_sensitive_data(&e.to_string())))
                    .with_source(e)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CompletionError::transport("failed to read response body").with_source(e.without_url())
        })?;
        debug!(status = status.as_u16(), body_len = text.len(), "Gemini responded");

        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), &text));
        }
        extract_reply(&text)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationParams,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(cfg: &GenerationConfig) -> Self {
        Self {
            temperature: cfg.temperature(),
            top_p: cfg.top_p(),
            top_k: cfg.top_k(),
            max_output_tokens: cfg.max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

fn safety_settings(cfg: &SafetyConfig) -> Vec<SafetySetting> {
    [
        ("HARM_CATEGORY_HARASSMENT", cfg.harassment()),
        ("HARM_CATEGORY_HATE_SPEECH", cfg.hate_speech()),
        ("HARM_CATEGORY_SEXUALLY_EXPLICIT", cfg.sexually_explicit()),
        ("HARM_CATEGORY_DANGEROUS_CONTENT", cfg.dangerous_content()),
    ]
    .into_iter()
    .map(|(category, threshold)| SafetySetting {
        category,
        threshold: threshold.api_value(),
    })
    .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Map a non-2xx response to a completion error.
fn classify_http_error(status: u16, body: &str) -> CompletionError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };
    let message = redact_sensitive_data(&message);
    let key_rejected = message.to_ascii_lowercase().contains("api key")
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED";

    match status {
        401 | 403 => CompletionError::auth(format!("HTTP {status}: {message}")),
        400 if key_rejected => CompletionError::auth(format!("HTTP {status}: {message}")),
        _ => CompletionError::service(format!("Gemini API error (HTTP {status}): {message}")),
    }
}

/// Pull the reply text out of a successful response body.
fn extract_reply(body: &str) -> Result<String, CompletionError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::malformed("response is not a generateContent result").with_source(e))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CompletionError::content_policy(format!("prompt blocked: {reason}")));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::empty("response has no candidates"))?;

    let reason = candidate.finish_reason.unwrap_or_else(|| "UNSPECIFIED".to_string());
    if POLICY_FINISH_REASONS.contains(&reason.as_str()) {
        return Err(CompletionError::content_policy(format!("answer withheld: {reason}")));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(CompletionError::empty(format!("no text in reply (finish reason {reason})")));
    }
    Ok(text)
}
