//! Command data model: intents, the parser→executor wire format, materialized
//! commands, and result/batch types (spec §3.1, §3.2).
//!
//! This module is data-only. The factory that turns a `CommandDict` into a
//! `Command`, and the executor that runs a `Command` against live session and
//! menu state, live in `drivethru-commands` — they need trait objects this
//! crate does not depend on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ErrorCategory, ErrorCode};
use crate::order::Modifier;

/// High-level classification of user desire (spec GLOSSARY). This is the
/// classifier's output and the FSM's input alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentType {
    AddItem,
    RemoveItem,
    ModifyItem,
    SetQuantity,
    ClearOrder,
    ConfirmOrder,
    Repeat,
    Question,
    SmallTalk,
    Unknown,
}

impl IntentType {
    pub const ALL: [IntentType; 10] = [
        IntentType::AddItem,
        IntentType::RemoveItem,
        IntentType::ModifyItem,
        IntentType::SetQuantity,
        IntentType::ClearOrder,
        IntentType::ConfirmOrder,
        IntentType::Repeat,
        IntentType::Question,
        IntentType::SmallTalk,
        IntentType::Unknown,
    ];

    /// Whether this intent, if allowed by the FSM, mutates the order.
    pub fn is_order_mutating(&self) -> bool {
        matches!(
            self,
            IntentType::AddItem
                | IntentType::RemoveItem
                | IntentType::ModifyItem
                | IntentType::SetQuantity
                | IntentType::ClearOrder
        )
    }
}

/// Parser output: the wire format between a parser (rule-based or
/// LLM-backed) and the command executor (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDict {
    pub intent: String,
    pub confidence: f32,
    #[serde(default)]
    pub slots: HashMap<String, serde_json::Value>,
}

impl CommandDict {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            confidence: 1.0,
            slots: HashMap::new(),
        }
    }

    pub fn with_slot(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.slots.insert(key.into(), value);
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.slots.get(key).and_then(|v| v.as_str())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.slots.get(key).and_then(|v| v.as_u64())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.slots.get(key).and_then(|v| v.as_i64())
    }
}

/// A materialized, executable unit derived from a `CommandDict` (spec §3.1).
/// `ClarificationNeeded` and `ItemUnavailable` are terminal outcomes emitted
/// directly by the ADD_ITEM resolver (spec §4.4.1) rather than by the
/// classifier — they still flow through the same executor/aggregator path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    AddItem {
        menu_item_id: String,
        quantity: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<String>,
        #[serde(default)]
        modifiers: Vec<Modifier>,
        #[serde(skip_serializing_if = "Option::is_none")]
        special_instructions: Option<String>,
    },
    RemoveItem {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_item_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_ref: Option<String>,
    },
    ModifyItem {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_item_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_ref: Option<String>,
        #[serde(default)]
        add_modifiers: Vec<Modifier>,
        #[serde(default)]
        remove_modifiers: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        set_quantity: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        set_size: Option<String>,
    },
    SetQuantity {
        #[serde(skip_serializing_if = "Option::is_none")]
        order_item_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_ref: Option<String>,
        quantity: u32,
    },
    ClearOrder,
    ConfirmOrder,
    Repeat,
    Question {
        text: String,
    },
    SmallTalk {
        text: String,
    },
    ClarificationNeeded {
        ambiguous_item: String,
        suggested_options: Vec<String>,
        clarification_question: String,
    },
    ItemUnavailable {
        requested_item: String,
        message: String,
    },
    Unknown,
}

impl Command {
    /// The intent family this command belongs to, for `command_family`
    /// computation in `CommandBatchResult` (spec §3.1).
    pub fn intent_type(&self) -> IntentType {
        match self {
            Command::AddItem { .. } => IntentType::AddItem,
            Command::RemoveItem { .. } => IntentType::RemoveItem,
            Command::ModifyItem { .. } => IntentType::ModifyItem,
            Command::SetQuantity { .. } => IntentType::SetQuantity,
            Command::ClearOrder => IntentType::ClearOrder,
            Command::ConfirmOrder => IntentType::ConfirmOrder,
            Command::Repeat => IntentType::Repeat,
            Command::Question { .. } => IntentType::Question,
            Command::SmallTalk { .. } => IntentType::SmallTalk,
            Command::ClarificationNeeded { .. } | Command::ItemUnavailable { .. } => {
                IntentType::AddItem
            }
            Command::Unknown => IntentType::Unknown,
        }
    }
}

/// Outcome bucket for an `OrderResult` (spec §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderResultStatus {
    Success,
    Error,
    Warning,
    PartialSuccess,
}

/// Result of executing a single command (spec §3.1, §3.2). Invariant: either
/// `status` is `success`/`partial_success` with a non-empty `message`, or
/// `status` is `error` with `error_category` set (and `error_code` set
/// unless it is a bare system error).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub status: OrderResultStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl OrderResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OrderResultStatus::Success,
            message: message.into(),
            data: None,
            error_category: None,
            error_code: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn success_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        let mut r = Self::success(message);
        r.data = Some(data);
        r
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            status: OrderResultStatus::Warning,
            message: message.into(),
            data: None,
            error_category: None,
            error_code: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn partial_success(message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            status: OrderResultStatus::PartialSuccess,
            message: message.into(),
            data: None,
            error_category: None,
            error_code: None,
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn error(category: ErrorCategory, code: Option<ErrorCode>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: OrderResultStatus::Error,
            message: message.clone(),
            data: None,
            error_category: Some(category),
            error_code: code,
            errors: vec![message],
            warnings: Vec::new(),
        }
    }

    pub fn validation_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::error(ErrorCategory::Validation, Some(code), message)
    }

    pub fn business_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::error(ErrorCategory::Business, Some(code), message)
    }

    pub fn system_error(message: impl Into<String>) -> Self {
        Self::error(ErrorCategory::System, Some(ErrorCode::InternalError), message)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn response_type(&self) -> Option<&str> {
        self.data.as_ref()?.get("response_type")?.as_str()
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            OrderResultStatus::Success | OrderResultStatus::PartialSuccess
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, OrderResultStatus::Error)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Coarse characterization of a batch's overall shape (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOutcome {
    AllSuccess,
    PartialSuccessContinue,
    PartialSuccessAsk,
    AllFailed,
    NeedsClarification,
}

/// What the orchestrator should do after this turn's batch (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpAction {
    Continue,
    Ask,
    Stop,
}

/// Aggregate result of executing a batch of commands within one turn (spec
/// §3.1, §3.2). Built by `drivethru-commands::batch::analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandBatchResult {
    pub total_commands: usize,
    pub successful_commands: usize,
    pub failed_commands: usize,
    pub results: Vec<OrderResult>,
    pub errors_by_category: HashMap<ErrorCategory, u32>,
    pub errors_by_code: HashMap<ErrorCode, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_family: Option<IntentType>,
    pub batch_outcome: BatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_error_code: Option<ErrorCode>,
    pub summary_message: String,
    pub follow_up_action: FollowUpAction,
}

impl CommandBatchResult {
    /// Invariant from spec §3.2 / §8: `total == successful + failed`.
    pub fn is_well_formed(&self) -> bool {
        self.total_commands == self.successful_commands + self.failed_commands
    }

    pub fn has_successes(&self) -> bool {
        self.successful_commands > 0
    }

    pub fn has_failures(&self) -> bool {
        self.failed_commands > 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.total_commands > 0 && self.failed_commands == 0
    }

    pub fn all_failed(&self) -> bool {
        self.total_commands > 0 && self.successful_commands == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_result_factories_set_categories() {
        let r = OrderResult::business_error(ErrorCode::ItemUnavailable, "no lobster roll");
        assert!(r.is_error());
        assert_eq!(r.error_category, Some(ErrorCategory::Business));
        assert_eq!(r.error_code, Some(ErrorCode::ItemUnavailable));
    }

    #[test]
    fn command_dict_slot_accessors() {
        let dict = CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!("42"))
            .with_slot("quantity", serde_json::json!(2));
        assert_eq!(dict.get_str("menu_item_id"), Some("42"));
        assert_eq!(dict.get_u64("quantity"), Some(2));
    }
}
