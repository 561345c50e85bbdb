use std::sync::Arc;

use sn_core::{Error, InferenceSettings, Result, TextGenerator};

pub mod deepseek;
pub mod dummy;
pub mod gemini;
#[cfg(feature = "ollama")]
pub mod langchain;

/// Marks where the text a prompt operates on begins and ends.
pub const TEXT_START: &str = "---BEGIN TEXT---";
pub const TEXT_END: &str = "---END TEXT---";

/// Wraps `body` between the text markers.
pub fn delimit(body: &str) -> String {
    format!("{}\n{}\n{}", TEXT_START, body, TEXT_END)
}

/// The delimited text of `prompt`, or `None` when it carries no markers.
pub fn delimited_text(prompt: &str) -> Option<&str> {
    let (_, rest) = prompt.split_once(TEXT_START)?;
    let (body, _) = rest.split_once(TEXT_END)?;
    Some(body.trim())
}

pub fn create_model(settings: &InferenceSettings) -> Result<Arc<dyn TextGenerator>> {
    let model: Arc<dyn TextGenerator> = match settings.model.to_lowercase().as_str() {
        "dummy" => Arc::new(dummy::DummyModel::new()),
        "deepseek" => Arc::new(deepseek::DeepSeekModel::new(
            settings.api_key(),
            settings.model_url.clone(),
            settings.model_name.clone(),
        )?),
        "gemini" => Arc::new(gemini::GeminiModel::new(
            settings.api_key(),
            settings.model_url.clone(),
            settings.model_name.clone(),
        )?),
        #[cfg(feature = "ollama")]
        "ollama" => Arc::new(langchain::OllamaModel::new(
            settings.model_url.as_deref(),
            settings.model_name.as_deref(),
        )?),
        #[cfg(not(feature = "ollama"))]
        "ollama" => {
            return Err(Error::Config(
                "the ollama backend requires building with the `ollama` feature".to_string(),
            ))
        }
        other => return Err(Error::Config(format!("unknown model backend: {}", other))),
    };
    tracing::debug!("Using text generation backend {}", model.name());
    Ok(model)
}
