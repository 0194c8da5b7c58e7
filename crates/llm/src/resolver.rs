//! Stage 2 of the ADD_ITEM resolver (spec §4.4.1): a tool-using agent that
//! resolves one extracted item against the restaurant's menu.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drivethru_core::llm_types::{GenerateRequest, Message};
use drivethru_core::traits::LanguageModel;
use drivethru_menu::tools::{execute_tool, tool_definitions};
use drivethru_menu::MenuCache;

use crate::extractor::ExtractedItem;
use crate::LlmError;

const SYSTEM_PROMPT: &str = "You resolve a candidate order item against this restaurant's menu. \
Use search_menu_items to find candidates and get_menu_item_details to inspect one. When you are \
done, reply with exactly one JSON object (no tool call) matching: {\"menu_item_id\": string or \
null, \"resolved_name\": string or null, \"is_ambiguous\": bool, \"is_unavailable\": bool, \
\"confidence\": float, \"suggested_options\": [string], \"clarification_question\": string or \
null}.";

const MAX_TOOL_ROUNDS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResolution {
    pub menu_item_id: Option<String>,
    pub resolved_name: Option<String>,
    pub is_ambiguous: bool,
    pub is_unavailable: bool,
    pub confidence: f32,
    #[serde(default)]
    pub suggested_options: Vec<String>,
    #[serde(default)]
    pub clarification_question: Option<String>,
}

pub struct MenuResolver {
    llm: Arc<dyn LanguageModel>,
    menu: Arc<MenuCache>,
}

impl MenuResolver {
    pub fn new(llm: Arc<dyn LanguageModel>, menu: Arc<MenuCache>) -> Self {
        Self { llm, menu }
    }

    pub async fn resolve(&self, restaurant_id: &str, item: &ExtractedItem) -> drivethru_core::Result<ItemResolution> {
        let tools = tool_definitions();
        let mut request = GenerateRequest::new(SYSTEM_PROMPT)
            .with_temperature(0.1)
            .with_max_tokens(400)
            .with_tools(tools.clone())
            .with_user_message(format!(
                "Candidate item: \"{}\" (requested quantity {})",
                item.item_name, item.quantity
            ));

        for _round in 0..MAX_TOOL_ROUNDS {
            let response = self.llm.generate_with_tools(request.clone(), &tools).await?;

            if response.has_tool_calls() {
                request.messages.push(Message::assistant(response.text.clone()));
                for call in &response.tool_calls {
                    let tool_result = execute_tool(&self.menu, restaurant_id, call)
                        .await
                        .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
                    request.messages.push(Message::tool(tool_result, call.id.clone()));
                }
                continue;
            }

            return serde_json::from_str(response.text.trim())
                .map_err(|e| LlmError::InvalidResponse(e.to_string()).into());
        }

        Err(LlmError::Generation(format!(
            "menu resolution exceeded {MAX_TOOL_ROUNDS} tool-call rounds for \"{}\"",
            item.item_name
        ))
        .into())
    }
}
