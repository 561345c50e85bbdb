use async_trait::async_trait;

use crate::Result;

/// A text-in/text-out generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language` (ISO 639-1 code).
    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;
}

pub trait LanguageDetector: Send + Sync {
    /// Returns an ISO 639-1 code, or an error for unclassifiable input.
    fn detect(&self, text: &str) -> Result<String>;
}
