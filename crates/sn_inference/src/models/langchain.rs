use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use langchain_rust::language_models::llm::LLM;
use langchain_rust::llm::client::GenerationOptions;
use langchain_rust::llm::ollama::client::{Ollama, OllamaClient};
use sn_core::{Error, Result, TextGenerator};
use url::Url;

const DEFAULT_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "gemma3:12b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaEndpoint {
    pub host: String,
    pub port: u16,
    pub model_name: String,
}

impl OllamaEndpoint {
    /// `model_url` may carry the model as its path, e.g.
    /// `http://localhost:11434/llama3`; an explicit `model_name` wins.
    pub fn parse(model_url: Option<&str>, model_name: Option<&str>) -> Result<Self> {
        let url = Url::parse(model_url.unwrap_or(DEFAULT_URL))
            .map_err(|e| Error::Config(format!("invalid Ollama URL: {}", e)))?;
        let path_model = url.path().trim_matches('/');
        let model_name = model_name
            .map(str::to_string)
            .or_else(|| (!path_model.is_empty()).then(|| path_model.to_string()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            host: format!("{}://{}", url.scheme(), url.host_str().unwrap_or("localhost")),
            port: url.port().unwrap_or(11434),
            model_name,
        })
    }
}

pub struct OllamaModel {
    ollama: Ollama,
    endpoint: OllamaEndpoint,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("ollama", &"<Ollama>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(model_url: Option<&str>, model_name: Option<&str>) -> Result<Self> {
        let endpoint = OllamaEndpoint::parse(model_url, model_name)?;
        let client = Arc::new(OllamaClient::new(endpoint.host.clone(), endpoint.port));
        let ollama = Ollama::new(client, endpoint.model_name.clone(), Some(GenerationOptions::default()));
        Ok(Self { ollama, endpoint })
    }
}

#[async_trait]
impl TextGenerator for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.ollama.invoke(prompt).await.map_err(|e| {
            Error::External(anyhow!(
                "Ollama at {}:{} failed with model '{}': {}",
                self.endpoint.host,
                self.endpoint.port,
                self.endpoint.model_name,
                e
            ))
        })?;
        let response = response.trim();
        if response.is_empty() {
            return Err(Error::Inference("Ollama returned an empty response".to_string()));
        }
        Ok(response.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_url() {
        let endpoint = OllamaEndpoint::parse(Some("http://gpu-box:11500/llama3"), None).unwrap();
        assert_eq!(endpoint.host, "http://gpu-box");
        assert_eq!(endpoint.port, 11500);
        assert_eq!(endpoint.model_name, "llama3");

        let endpoint = OllamaEndpoint::parse(None, Some("qwen2")).unwrap();
        assert_eq!(endpoint.host, "http://localhost");
        assert_eq!(endpoint.port, 11434);
        assert_eq!(endpoint.model_name, "qwen2");

        assert_eq!(OllamaEndpoint::parse(None, None).unwrap().model_name, DEFAULT_MODEL);
    }
}
