use async_trait::async_trait;

use crate::error::AppResult;

/// A remote text-generation provider.
///
/// Implementations issue exactly one upstream request per call and never retry.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt`. An empty prompt is forwarded as is.
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}
