//! Tool bindings for the two-stage ADD_ITEM resolver's menu-lookup agent
//! (spec §4.4.1: `search_menu_items`, `get_menu_item_details`).

use drivethru_core::ToolCall;
use drivethru_core::ToolDefinition;
use serde_json::json;

use crate::cache::MenuCache;
use crate::error::{MenuError, Result};

pub const SEARCH_MENU_ITEMS: &str = "search_menu_items";
pub const GET_MENU_ITEM_DETAILS: &str = "get_menu_item_details";

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            SEARCH_MENU_ITEMS,
            "Search the restaurant's available menu items by name fragment.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Free-text item name fragment" }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            GET_MENU_ITEM_DETAILS,
            "Get the ingredient list for a named menu item.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Exact menu item name" }
                },
                "required": ["name"]
            }),
        ),
    ]
}

/// Dispatch a model-issued tool call against the menu cache, returning the
/// JSON text to feed back into the conversation as a tool message.
pub async fn execute_tool(cache: &MenuCache, restaurant_id: &str, call: &ToolCall) -> Result<String> {
    match call.name.as_str() {
        SEARCH_MENU_ITEMS => {
            let query = call
                .get_string("query")
                .ok_or_else(|| MenuError::Repository("missing `query` argument".to_string()))?;
            let items = cache.search_menu_items(restaurant_id, query).await?;
            let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
            Ok(json!({ "candidates": names }).to_string())
        }
        GET_MENU_ITEM_DETAILS => {
            let name = call
                .get_string("name")
                .ok_or_else(|| MenuError::Repository("missing `name` argument".to_string()))?;
            let item = cache
                .get_menu_item_by_name(restaurant_id, name)
                .await?
                .ok_or_else(|| MenuError::ItemNotFound(name.to_string()))?;
            let ingredients = cache.get_menu_item_ingredients(restaurant_id, &item.id).await?;
            let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
            Ok(json!({ "menu_item_id": item.id, "ingredients": names }).to_string())
        }
        other => Err(MenuError::UnknownTool(other.to_string())),
    }
}
