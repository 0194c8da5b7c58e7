//! Language model trait boundary.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;
use crate::llm_types::{GenerateRequest, GenerateResponse, StreamChunk, ToolDefinition};

/// A chat-completion backend. Every pipeline stage that needs a model call
/// (intent classification, item extraction, menu resolution) goes through
/// this trait rather than a concrete HTTP client, so tests can substitute a
/// scripted mock.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>>;

    /// Generate with tool/function calling available (spec §4.4.1's
    /// menu-resolution agent: `search_menu_items`, `get_menu_item_details`).
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse>;

    async fn is_available(&self) -> bool;

    fn model_name(&self) -> &str;

    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count() / 4
    }
}
