//! End-to-end analysis: prompt + image → vision backend → parsed report.

use std::sync::Arc;
use std::time::Instant;

use photocritic_config::PhotoCriticConfig;
use photocritic_core::{AnalysisError, AnalysisReport, ImageInput, VisionCompletion};
use photocritic_logging::{AnalysisEvent, EventLogger, redact_sensitive_data, truncate_for_log};
use tracing::{debug, info};
use uuid::Uuid;

use crate::parser::ReportParser;
use crate::prompt::PromptBuilder;

/// Raw replies are logged at debug level up to this many characters.
const RAW_REPLY_LOG_CHARS: usize = 2000;

pub struct PhotoAnalyzer {
    client: Arc<dyn VisionCompletion>,
    parser: ReportParser,
    prompt: String,
}

impl PhotoAnalyzer {
    pub fn new(client: Arc<dyn VisionCompletion>, parser: ReportParser) -> Self {
        Self {
            client,
            parser,
            prompt: PromptBuilder::build(),
        }
    }

    /// Analyzer with the heading policy taken from config.
    pub fn from_config(client: Arc<dyn VisionCompletion>, config: &PhotoCriticConfig) -> Self {
        Self::new(client, ReportParser::from_config(config))
    }

    pub fn backend(&self) -> &str {
        self.client.name()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Send the image with the fixed prompt and parse the reply.
    ///
    /// Exactly one completion request is made. No partial report is ever
    /// returned.
    pub async fn analyze(&self, image: &ImageInput) -> Result<AnalysisReport, AnalysisError> {
        let analysis_id = Uuid::new_v4();
        let backend = self.client.name().to_string();
        EventLogger::log_event(
            analysis_id,
            AnalysisEvent::Requested {
                backend: backend.clone(),
                mime_type: image.mime_type().to_string(),
                image_bytes: image.len(),
            },
        );

        let result = self.run(analysis_id, &backend, image).await;
        match &result {
            Ok(report) => EventLogger::log_event(
                analysis_id,
                AnalysisEvent::Parsed {
                    confidences: report.entries().iter().map(|e| e.confidence.value()).collect(),
                    average_confidence: report.average_confidence(),
                },
            ),
            Err(e) => EventLogger::log_event(
                analysis_id,
                AnalysisEvent::Failed {
                    kind: e.kind().to_string(),
                    error_msg: e.to_string(),
                },
            ),
        }
        result
    }

    async fn run(
        &self,
        analysis_id: Uuid,
        backend: &str,
        image: &ImageInput,
    ) -> Result<AnalysisReport, AnalysisError> {
        let started = Instant::now();
        let reply = self.client.analyze(&self.prompt, image).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        EventLogger::log_event(
            analysis_id,
            AnalysisEvent::Completed {
                backend: backend.to_string(),
                latency_ms,
                reply_chars: reply.chars().count(),
            },
        );
        debug!(
            analysis_id = %analysis_id,
            reply = %truncate_for_log(&redact_sensitive_data(&reply), RAW_REPLY_LOG_CHARS),
            "Raw vision reply"
        );

        let report = self.parser.parse(&reply)?;
        info!(
            analysis_id = %analysis_id,
            average_confidence = report.average_confidence(),
            "Photo analysis complete"
        );
        Ok(report)
    }
}
