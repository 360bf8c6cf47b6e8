use async_trait::async_trait;

use crate::error::CompletionError;
use crate::image::ImageInput;

/// A hosted vision-capable model.
///
/// One call is one outbound request; implementations must not retry or cache.
#[async_trait]
pub trait VisionCompletion: Send + Sync {
    /// Backend name used in logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send the instruction text and the image, return the reply text.
    async fn analyze(&self, prompt: &str, image: &ImageInput) -> Result<String, CompletionError>;
}
