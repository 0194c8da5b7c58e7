//! Slot extraction for the order-mutation intents REMOVE_ITEM, MODIFY_ITEM,
//! SET_QUANTITY (spec §4.4: "LLM-backed parsers ... may emit multiple
//! commands"). All three share one model call because they need the same
//! thing: which line item, and what changed about it.

use std::sync::Arc;

use serde::Deserialize;

use drivethru_core::llm_types::GenerateRequest;
use drivethru_core::order::Modifier;
use drivethru_core::traits::LanguageModel;
use drivethru_core::CommandDict;

use crate::LlmError;

const SYSTEM_PROMPT: &str = "You extract order-mutation commands from a drive-thru customer's \
utterance. The order so far and the item they last mentioned are given for anaphora (\"remove \
that\", \"make it two\"). Return strict JSON: {\"commands\": [{\"target_ref\": string or null, \
\"order_item_id\": string or null, \"add_modifiers\": [{\"name\": string, \"is_addition\": bool, \
\"additional_cost\": number}], \"remove_modifiers\": [string], \"set_quantity\": integer or null, \
\"set_size\": string or null, \"quantity\": integer or null}]}. Set target_ref to \"last\" when the \
customer refers to the item anaphorically rather than by name. Emit one command object per distinct \
item the utterance touches. Output only the JSON object.";

#[derive(Debug, Clone, Default, Deserialize)]
struct MutationSlots {
    #[serde(default)]
    target_ref: Option<String>,
    #[serde(default)]
    order_item_id: Option<String>,
    #[serde(default)]
    add_modifiers: Vec<Modifier>,
    #[serde(default)]
    remove_modifiers: Vec<String>,
    #[serde(default)]
    set_quantity: Option<u32>,
    #[serde(default)]
    set_size: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    commands: Vec<MutationSlots>,
}

/// Shared slot extractor for REMOVE_ITEM, MODIFY_ITEM and SET_QUANTITY.
pub struct MutationParser {
    llm: Arc<dyn LanguageModel>,
}

impl MutationParser {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// `intent` is one of `REMOVE_ITEM`, `MODIFY_ITEM`, `SET_QUANTITY`.
    pub async fn parse(
        &self,
        intent: &str,
        transcript: &str,
        order_summary: &str,
        last_mentioned_ref: Option<&str>,
    ) -> drivethru_core::Result<Vec<CommandDict>> {
        let context = format!(
            "Order so far: {order_summary}\nLast mentioned item: {}\nUtterance: {transcript}",
            last_mentioned_ref.unwrap_or("none")
        );
        let request = GenerateRequest::new(SYSTEM_PROMPT)
            .with_temperature(0.1)
            .with_max_tokens(300)
            .with_user_message(context);

        let response = self.llm.generate(request).await?;
        let parsed: MutationResponse = serde_json::from_str(response.text.trim())
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .commands
            .into_iter()
            .map(|slots| Self::to_dict(intent, slots, last_mentioned_ref))
            .collect())
    }

    fn to_dict(intent: &str, slots: MutationSlots, last_mentioned_ref: Option<&str>) -> CommandDict {
        let mut dict = CommandDict::new(intent);

        if let Some(id) = slots.order_item_id.filter(|s| !s.is_empty()) {
            dict = dict.with_slot("order_item_id", serde_json::json!(id));
        } else if let Some(target) = slots
            .target_ref
            .filter(|s| !s.is_empty())
            .or_else(|| last_mentioned_ref.map(str::to_string))
        {
            dict = dict.with_slot("target_ref", serde_json::json!(target));
        }

        match intent {
            "MODIFY_ITEM" => {
                if !slots.add_modifiers.is_empty() {
                    dict = dict.with_slot("add_modifiers", serde_json::json!(slots.add_modifiers));
                }
                if !slots.remove_modifiers.is_empty() {
                    dict = dict.with_slot("remove_modifiers", serde_json::json!(slots.remove_modifiers));
                }
                if let Some(q) = slots.set_quantity {
                    dict = dict.with_slot("set_quantity", serde_json::json!(q));
                }
                if let Some(size) = slots.set_size {
                    dict = dict.with_slot("set_size", serde_json::json!(size));
                }
            }
            "SET_QUANTITY" => {
                let quantity = slots.quantity.or(slots.set_quantity).unwrap_or(1);
                dict = dict.with_slot("quantity", serde_json::json!(quantity));
            }
            _ => {}
        }

        dict
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
    async fn remove_item_falls_back_to_last_mentioned_ref() {
        let body = r#"{"commands": [{"target_ref": null, "order_item_id": null, "add_modifiers": [], "remove_modifiers": [], "set_quantity": null, "set_size": null, "quantity": null}]}"#;
        let parser = MutationParser::new(Arc::new(ScriptedLlm(body.to_string())));
        let dicts = parser
            .parse("REMOVE_ITEM", "remove that", "1 big mac", Some("line-1"))
            .await
            .unwrap();
        assert_eq!(dicts.len(), 1);
        assert_eq!(dicts[0].get_str("target_ref"), Some("line-1"));
    }

    #[tokio::test]
    async fn modify_item_carries_add_and_remove_modifiers() {
        let body = r#"{"commands": [{"target_ref": "big mac", "order_item_id": null, "add_modifiers": [{"name": "extra cheese", "is_addition": true, "additional_cost": 0.5}], "remove_modifiers": ["onions"], "set_quantity": null, "set_size": null, "quantity": null}]}"#;
        let parser = MutationParser::new(Arc::new(ScriptedLlm(body.to_string())));
        let dicts = parser
            .parse("MODIFY_ITEM", "add extra cheese and no onions to the big mac", "1 big mac", None)
            .await
            .unwrap();
        assert_eq!(dicts.len(), 1);
        assert_eq!(dicts[0].get_str("target_ref"), Some("big mac"));
        assert!(dicts[0].slots.contains_key("add_modifiers"));
        assert!(dicts[0].slots.contains_key("remove_modifiers"));
    }

    #[tokio::test]
    async fn set_quantity_defaults_to_one_when_unspecified() {
        let body = r#"{"commands": [{"target_ref": "last", "order_item_id": null, "add_modifiers": [], "remove_modifiers": [], "set_quantity": null, "set_size": null, "quantity": null}]}"#;
        let parser = MutationParser::new(Arc::new(ScriptedLlm(body.to_string())));
        let dicts = parser
            .parse("SET_QUANTITY", "just one", "2 big macs", Some("line-1"))
            .await
            .unwrap();
        assert_eq!(dicts[0].get_u64("quantity"), Some(1));
    }
}
