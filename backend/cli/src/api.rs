use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use photocritic_core::{AnalysisError, ImageError};
use photocritic_media::image_from_upload;
use photocritic_understanding::{PhotoAnalyzer, PromptBuilder};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// Shared application state for API handlers.
pub struct AppState {
    /// Held for the whole analysis so requests are served one at a time.
    pub analyzer: Mutex<PhotoAnalyzer>,
    pub max_image_bytes: usize,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_image_bytes;
    Router::new()
        .route("/api/health", get(health))
        .route("/api/prompt", get(prompt))
        .route("/api/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let analyzer = state.analyzer.try_lock();
    Json(json!({
        "status": "ok",
        "service": "photocritic",
        "version": env!("CARGO_PKG_VERSION"),
        "busy": analyzer.is_err(),
    }))
}

/// The fixed prompt sent with every image.
async fn prompt() -> Json<Value> {
    Json(json!({ "prompt": PromptBuilder::build() }))
}

/// Analyze an uploaded image. The body is the raw image; `Content-Type`
/// names its format.
async fn analyze(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let image = match image_from_upload(body, content_type, state.max_image_bytes) {
        Ok(image) => image,
        Err(e) => return error_response(&AnalysisError::from(e)),
    };

    let analyzer = state.analyzer.lock().await;
    match analyzer.analyze(&image).await {
        Ok(report) => Json(json!({ "report": report })).into_response(),
        Err(e) => error_response(&e),
    }
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Image(ImageError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        AnalysisError::Image(ImageError::Unsupported(_) | ImageError::SignatureMismatch { .. }) => {
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        }
        AnalysisError::Image(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::Completion(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: &AnalysisError) -> Response {
    tracing::warn!(kind = err.kind(), error = %err, "Analysis request failed");
    let body = json!({
        "error": {
            "kind": err.kind(),
            "message": err.to_string(),
        }
    });
    (status_for(err), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use photocritic_core::CompletionErrorKind;
    use photocritic_understanding::{MockVisionClient, ReportParser};

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn reply() -> String {
        let mut out = String::new();
        for (i, score) in [90, 75, 88, 60, 95, 100].iter().enumerate() {
            out.push_str(&format!("**{}. Section:**\nLooks fine. (confidence: {score}%)\n\n", i + 1));
        }
        out.push_str("**Final review:**\nSuitable.");
        out
    }

    fn state(client: MockVisionClient) -> Arc<AppState> {
        Arc::new(AppState {
            analyzer: Mutex::new(PhotoAnalyzer::new(Arc::new(client), ReportParser::default())),
            max_image_bytes: 1024,
        })
    }

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn analyze_returns_report() {
        let response = analyze(
            State(state(MockVisionClient::with_reply(reply()))),
            headers("image/png"),
            Bytes::from_static(PNG_HEADER),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["report"]["entries"][3]["confidence"], 60);
        assert_eq!(body["report"]["final_review"], "Suitable.");
    }

    #[tokio::test]
    async fn image_errors_map_to_client_statuses() {
        let unsupported = analyze(
            State(state(MockVisionClient::with_reply(reply()))),
            headers("image/gif"),
            Bytes::from_static(b"GIF89a"),
        )
        .await;
        assert_eq!(unsupported.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body_json(unsupported).await["error"]["kind"], "image");

        let empty = analyze(
            State(state(MockVisionClient::with_reply(reply()))),
            headers("image/png"),
            Bytes::new(),
        )
        .await;
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let mut big = PNG_HEADER.to_vec();
        big.resize(2048, 0);
        let too_large = analyze(
            State(state(MockVisionClient::with_reply(reply()))),
            headers("image/png"),
            Bytes::from(big),
        )
        .await;
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn completion_and_parse_failures_map_to_server_statuses() {
        let upstream = analyze(
            State(state(MockVisionClient::failing(CompletionErrorKind::Service, "quota"))),
            headers("image/png"),
            Bytes::from_static(PNG_HEADER),
        )
        .await;
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(upstream).await["error"]["kind"], "completion");

        let garbled = analyze(
            State(state(MockVisionClient::with_reply("no report here"))),
            headers("image/png"),
            Bytes::from_static(PNG_HEADER),
        )
        .await;
        assert_eq!(garbled.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn prompt_endpoint_serves_fixed_prompt() {
        let Json(body) = prompt().await;
        assert_eq!(body["prompt"], PromptBuilder::build());
    }
}
