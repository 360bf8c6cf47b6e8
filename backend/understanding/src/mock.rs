use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use photocritic_core::{CompletionError, CompletionErrorKind, ImageInput, VisionCompletion};

/// A vision backend that returns a canned reply or a canned failure.
///
/// Used by tests and by `photocritic analyze --mock-reply` for offline runs.
pub struct MockVisionClient {
    outcome: Result<String, (CompletionErrorKind, String)>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockVisionClient {
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::from_outcome(Ok(reply.into()))
    }

    pub fn failing(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self::from_outcome(Err((kind, message.into())))
    }

    fn from_outcome(outcome: Result<String, (CompletionErrorKind, String)>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Number of completion requests made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl VisionCompletion for MockVisionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn analyze(&self, prompt: &str, _image: &ImageInput) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        match &self.outcome {
            Ok(reply) => Ok(reply.clone()),
            Err((kind, message)) => Err(CompletionError::new(*kind, message.clone())),
        }
    }
}
