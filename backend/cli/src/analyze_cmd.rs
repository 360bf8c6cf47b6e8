//! `analyze` and `parse` commands.
//!
//! Reports go to `out` (stdout in the binary); failures go to stderr as a
//! single line and leave `out` untouched.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use photocritic_config::PhotoCriticConfig;
use photocritic_core::{AnalysisError, AnalysisReport, VisionCompletion};
use photocritic_media::load_image;
use photocritic_understanding::{GeminiVisionClient, MockVisionClient, PhotoAnalyzer, ReportParser};
use tokio::fs;

use crate::terminal_output::{note_error, note_info, render_error, render_report, supports_color};

/// Analyze one image file and write the report.
///
/// `mock_reply` replays a saved model reply instead of calling the service.
pub async fn analyze(
    config: &PhotoCriticConfig,
    image_path: &Path,
    json: bool,
    mock_reply: Option<&Path>,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let client: Arc<dyn VisionCompletion> = match mock_reply {
        Some(reply_path) => Arc::new(MockVisionClient::with_reply(read_reply(reply_path).await?)),
        None => match GeminiVisionClient::from_config(config) {
            Ok(client) => Arc::new(client),
            Err(e) => return Ok(fail(&AnalysisError::from(e))),
        },
    };

    let image = match load_image(image_path, config.image.max_bytes()).await {
        Ok(image) => image,
        Err(e) => return Ok(fail(&AnalysisError::from(e))),
    };

    let analyzer = PhotoAnalyzer::from_config(client, config);
    if !json {
        note_info(&format!(
            "Analyzing {} ({}) with {}...",
            image_path.display(),
            image.format,
            analyzer.backend()
        ));
    }

    match analyzer.analyze(&image).await {
        Ok(report) => write_report(&report, json, out),
        Err(e) => Ok(fail(&e)),
    }
}

/// Parse a saved raw reply and write it as if it came from the service.
pub async fn parse(
    config: &PhotoCriticConfig,
    reply_path: &Path,
    json: bool,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let raw = read_reply(reply_path).await?;
    match ReportParser::from_config(config).parse(&raw) {
        Ok(report) => write_report(&report, json, out),
        Err(e) => Ok(fail(&AnalysisError::from(e))),
    }
}

fn write_report(report: &AnalysisReport, json: bool, out: &mut impl Write) -> Result<ExitCode> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
    } else {
        write!(out, "{}", render_report(report, supports_color()))?;
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn fail(err: &AnalysisError) -> ExitCode {
    note_error(&render_error(err));
    ExitCode::FAILURE
}

async fn read_reply(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read reply file: {}", path.display()))
}
