//! `CommandDict` → `Command` construction (spec §4.6 step 4, §9: "a factory
//! maps `CommandDict.intent` to the constructor"). Callers must validate the
//! dict first — this never fails on a dict that passed
//! [`crate::validator::CommandDataValidator`].

use drivethru_core::order::Modifier;
use drivethru_core::{Command, CommandDict};

pub fn build_command(dict: &CommandDict) -> Command {
    match dict.intent.as_str() {
        "ADD_ITEM" => Command::AddItem {
            menu_item_id: dict.get_str("menu_item_id").unwrap_or_default().to_string(),
            quantity: dict.get_u64("quantity").unwrap_or(1) as u32,
            size: dict.get_str("size").map(str::to_string),
            modifiers: modifiers_from_slot(dict, "modifiers"),
            special_instructions: dict.get_str("special_instructions").map(str::to_string),
        },
        "REMOVE_ITEM" => Command::RemoveItem {
            order_item_id: dict.get_str("order_item_id").map(str::to_string),
            target_ref: dict.get_str("target_ref").map(str::to_string),
        },
        "MODIFY_ITEM" => Command::ModifyItem {
            order_item_id: dict.get_str("order_item_id").map(str::to_string),
            target_ref: dict.get_str("target_ref").map(str::to_string),
            add_modifiers: modifiers_from_slot(dict, "add_modifiers"),
            remove_modifiers: string_list_from_slot(dict, "remove_modifiers"),
            set_quantity: dict.get_u64("set_quantity").map(|q| q as u32),
            set_size: dict.get_str("set_size").map(str::to_string),
        },
        "SET_QUANTITY" => Command::SetQuantity {
            order_item_id: dict.get_str("order_item_id").map(str::to_string),
            target_ref: dict.get_str("target_ref").map(str::to_string),
            quantity: dict.get_u64("quantity").unwrap_or(1) as u32,
        },
        "CLEAR_ORDER" => Command::ClearOrder,
        "CONFIRM_ORDER" => Command::ConfirmOrder,
        "REPEAT" => Command::Repeat,
        "QUESTION" => Command::Question {
            text: dict.get_str("text").unwrap_or_default().to_string(),
        },
        "SMALL_TALK" => Command::SmallTalk {
            text: dict.get_str("text").unwrap_or_default().to_string(),
        },
        "CLARIFICATION_NEEDED" => Command::ClarificationNeeded {
            ambiguous_item: dict.get_str("ambiguous_item").unwrap_or_default().to_string(),
            suggested_options: string_list_from_slot(dict, "suggested_options"),
            clarification_question: dict.get_str("clarification_question").unwrap_or_default().to_string(),
        },
        "ITEM_UNAVAILABLE" => Command::ItemUnavailable {
            requested_item: dict.get_str("requested_item").unwrap_or_default().to_string(),
            message: dict.get_str("message").unwrap_or_default().to_string(),
        },
        _ => Command::Unknown,
    }
}

fn modifiers_from_slot(dict: &CommandDict, key: &str) -> Vec<Modifier> {
    dict.slots
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

fn string_list_from_slot(dict: &CommandDict, key: &str) -> Vec<String> {
    dict.slots
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
