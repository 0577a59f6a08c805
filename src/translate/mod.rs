// Translation client
//
// This module isolates everything that talks to the language model:
// - Prompt: batch prompt construction and reply splitting
// - Gemini: REST client for the Generative Language API
// - Language: language code to name mapping used in prompts

pub mod gemini;
pub mod language;
pub mod prompt;

use async_trait::async_trait;

pub use gemini::GeminiTranslator;
pub use language::language_code_to_name;
pub use prompt::{build_batch_prompt, split_reply};

use crate::config::TranslateConfig;
use crate::error::Result;

/// Outcome of a single batch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationReply {
    /// Translated blocks in reply order; the count may differ from the request
    Blocks(Vec<String>),
    /// The provider answered without any text
    Empty,
    /// The provider refused the prompt on content policy grounds
    Blocked(String),
    /// Transport, status or decoding failure
    Failed(String),
}

impl TranslationReply {
    /// Build a reply from raw model text
    pub fn from_text(raw: &str) -> Self {
        let blocks = split_reply(raw);
        if blocks.is_empty() {
            Self::Empty
        } else {
            Self::Blocks(blocks)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Blocks(_))
    }

    /// Translated blocks; every non-success variant yields none
    pub fn into_blocks(self) -> Vec<String> {
        match self {
            Self::Blocks(blocks) => blocks,
            _ => Vec::new(),
        }
    }
}

/// Translates an ordered list of escaped subtitle blocks in one request.
///
/// Implementations must not fail: any provider problem is reported through
/// [`TranslationReply`] so the caller can fall back to the original text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchTranslator: Send + Sync {
    async fn translate_batch(
        &self,
        blocks: &[String],
        source_language: &str,
        target_language: &str,
    ) -> TranslationReply;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator (Gemini-based)
    pub fn create_translator(config: TranslateConfig, api_key: String) -> Result<Box<dyn BatchTranslator>> {
        Ok(Box::new(GeminiTranslator::new(config, api_key)?))
    }
}
