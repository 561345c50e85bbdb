use std::fmt;

use async_trait::async_trait;
use sn_core::{Result, TextGenerator};

use super::delimited_text;

const SUMMARY_WORDS: usize = 40;

/// Offline backend: echoes the first words of the text a prompt operates on.
#[derive(Default)]
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = delimited_text(prompt).unwrap_or(prompt);
        let words: Vec<&str> = body.split_whitespace().take(SUMMARY_WORDS).collect();
        Ok(words.join(" "))
    }
}
