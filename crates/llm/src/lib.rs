//! LLM-backed stages of the conversation pipeline: intent classification
//! (spec §4.2), the ADD_ITEM two-stage resolver (spec §4.4.1), and the
//! Ollama-compatible backend they run against.

pub mod classifier;
pub mod extractor;
pub mod mutation;
pub mod ollama;
pub mod resolver;

pub use classifier::{IntentClassificationResult, IntentClassifier};
pub use extractor::{ExtractedItem, ItemExtractor};
pub use mutation::MutationParser;
pub use ollama::{OllamaConfig, OllamaLanguageModel};
pub use resolver::{ItemResolution, MenuResolver};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("generation error: {0}")]
    Generation(String),

    #[error("api error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for drivethru_core::CoreError {
    fn from(err: LlmError) -> Self {
        drivethru_core::CoreError::ExternalService(err.to_string())
    }
}
