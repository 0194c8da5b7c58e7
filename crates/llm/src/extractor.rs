//! Stage 1 of the ADD_ITEM resolver (spec §4.4.1): pure text understanding,
//! no menu contact.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drivethru_core::llm_types::GenerateRequest;
use drivethru_core::traits::LanguageModel;

use crate::LlmError;

const SYSTEM_PROMPT: &str = "You extract candidate order items from a drive-thru customer's \
utterance. Return strict JSON: {\"items\": [{\"item_name\": string, \"quantity\": integer, \
\"size\": string or null, \"modifiers\": [string], \"special_instructions\": string or null, \
\"confidence\": float}]}. Never resolve against a menu; just report what was said. \
Output only the JSON object.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub item_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    items: Vec<ExtractedItem>,
}

pub struct ItemExtractor {
    llm: Arc<dyn LanguageModel>,
}

impl ItemExtractor {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, transcript: &str, order_summary: &str) -> drivethru_core::Result<Vec<ExtractedItem>> {
        let request = GenerateRequest::new(SYSTEM_PROMPT)
            .with_temperature(0.2)
            .with_max_tokens(400)
            .with_user_message(format!("Order so far: {order_summary}\nUtterance: {transcript}"));

        let response = self.llm.generate(request).await?;
        let parsed: ExtractionResponse = serde_json::from_str(response.text.trim())
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(parsed.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use drivethru_core::llm_types::{GenerateResponse, StreamChunk, ToolDefinition};
    use drivethru_core::Result;
    use std::pin::Pin;

    struct ScriptedLlm(String);

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            Ok(GenerateResponse::text(self.0.clone()))
        }

        fn generate_stream<'a>(
            &'a self,
            _request: GenerateRequest,
        ) -> Pin<Box<dyn futures::Stream<Item = Result<StreamChunk>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }

        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            _tools: &[ToolDefinition],
        ) -> Result<GenerateResponse> {
            self.generate(request).await
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn extracts_multiple_items_with_modifiers() {
        let body = r#"{"items": [
            {"item_name": "big mac", "quantity": 2, "size": null, "modifiers": ["no onions"], "special_instructions": null, "confidence": 0.9},
            {"item_name": "large coke", "quantity": 1, "size": "large", "modifiers": [], "special_instructions": null, "confidence": 0.88}
        ]}"#;
        let extractor = ItemExtractor::new(Arc::new(ScriptedLlm(body.to_string())));
        let items = extractor.extract("two big macs and a large coke, no onions on the second one", "empty").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].modifiers, vec!["no onions".to_string()]);
    }
}
