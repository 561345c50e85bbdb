use std::sync::Arc;

use async_trait::async_trait;
use sn_core::{Error, Result, TextGenerator, Translator};

use crate::models::delimit;

/// Translates by prompting a text generator.
pub struct ModelTranslator {
    generator: Arc<dyn TextGenerator>,
}

impl ModelTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ko" => "Korean",
        "ja" => "Japanese",
        "zh" => "Chinese",
        "ru" => "Russian",
        other => other,
    }
}

pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text into {}. Reply with the translation only, \
         without notes or quotation marks.\n\n{}",
        language_name(target_language),
        delimit(text)
    )
}

#[async_trait]
impl Translator for ModelTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let translated = self
            .generator
            .generate(&translation_prompt(text, target_language))
            .await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(Error::Inference(format!(
                "{} returned an empty translation",
                self.generator.name()
            )));
        }
        Ok(translated.to_string())
    }
}
