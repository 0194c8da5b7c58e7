//! Schema and slot-shape checks on parser output (spec §4.5).
//!
//! This is the only place quantity caps are enforced against
//! `OrderLimits` — everything else here is pure shape checking. A dict that
//! fails here never reaches the factory; the executor turns each
//! `ValidationError` directly into an `OrderResult` at the dict's original
//! index.

use drivethru_config::OrderLimits;
use drivethru_core::error::{ErrorCategory, ErrorCode};
use drivethru_core::CommandDict;

/// One validation failure, already carrying the taxonomy code the executor
/// needs to pick `OrderResult::validation_error` vs `business_error`.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

pub struct CommandDataValidator;

impl CommandDataValidator {
    /// `(ok, errors[])` per spec §4.5, expressed as a `Result` since Rust has
    /// no use for a redundant `ok` flag once the error list is empty.
    pub fn validate(dict: &CommandDict, limits: &OrderLimits) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match dict.intent.as_str() {
            "ADD_ITEM" => {
                if dict.get_str("menu_item_id").filter(|s| !s.is_empty()).is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        "ADD_ITEM requires a non-empty 'menu_item_id'",
                    ));
                }
                Self::check_quantity(dict, "quantity", limits, &mut errors, true);
            }
            "REMOVE_ITEM" => Self::require_target_ref(dict, "REMOVE_ITEM", &mut errors),
            "MODIFY_ITEM" => {
                Self::require_target_ref(dict, "MODIFY_ITEM", &mut errors);
                if dict.slots.contains_key("set_quantity") {
                    Self::check_quantity(dict, "set_quantity", limits, &mut errors, false);
                }
            }
            "SET_QUANTITY" => {
                Self::require_target_ref(dict, "SET_QUANTITY", &mut errors);
                Self::check_quantity(dict, "quantity", limits, &mut errors, true);
            }
            "CLEAR_ORDER" | "CONFIRM_ORDER" | "REPEAT" | "UNKNOWN" => {}
            "QUESTION" | "SMALL_TALK" => {
                if dict.get_str("text").filter(|s| !s.is_empty()).is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        format!("{} requires a non-empty 'text'", dict.intent),
                    ));
                }
            }
            "CLARIFICATION_NEEDED" => {
                if dict.get_str("ambiguous_item").is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        "CLARIFICATION_NEEDED requires 'ambiguous_item'",
                    ));
                }
                if dict.get_str("clarification_question").is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        "CLARIFICATION_NEEDED requires 'clarification_question'",
                    ));
                }
                match dict.slots.get("suggested_options") {
                    Some(v) if v.is_array() => {}
                    _ => errors.push(ValidationError::new(
                        ErrorCode::InvalidInputFormat,
                        "CLARIFICATION_NEEDED requires 'suggested_options' to be an array",
                    )),
                }
            }
            "ITEM_UNAVAILABLE" => {
                if dict.get_str("requested_item").is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        "ITEM_UNAVAILABLE requires 'requested_item'",
                    ));
                }
                if dict.get_str("message").is_none() {
                    errors.push(ValidationError::new(
                        ErrorCode::MissingRequiredField,
                        "ITEM_UNAVAILABLE requires 'message'",
                    ));
                }
            }
            other => errors.push(ValidationError::new(
                ErrorCode::InvalidInputFormat,
                format!("unknown intent '{other}'"),
            )),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn require_target_ref(dict: &CommandDict, intent: &str, errors: &mut Vec<ValidationError>) {
        let has_order_item_id = dict.get_str("order_item_id").filter(|s| !s.is_empty()).is_some();
        let has_target_ref = dict.get_str("target_ref").filter(|s| !s.is_empty()).is_some();
        if !has_order_item_id && !has_target_ref {
            errors.push(ValidationError::new(
                ErrorCode::MissingRequiredField,
                format!("{intent} requires one of 'order_item_id' or 'target_ref'"),
            ));
        }
    }

    fn check_quantity(
        dict: &CommandDict,
        key: &str,
        limits: &OrderLimits,
        errors: &mut Vec<ValidationError>,
        required: bool,
    ) {
        match dict.get_u64(key) {
            Some(q) if q >= 1 => {
                if q > limits.max_quantity_per_item as u64 {
                    errors.push(ValidationError::new(
                        ErrorCode::QuantityExceedsLimit,
                        format!(
                            "quantity {q} exceeds the maximum of {} per item",
                            limits.max_quantity_per_item
                        ),
                    ));
                }
            }
            Some(_) => errors.push(ValidationError::new(
                ErrorCode::InvalidQuantity,
                format!("'{key}' must be at least 1"),
            )),
            None if required => errors.push(ValidationError::new(
                ErrorCode::InvalidQuantity,
                format!("'{key}' is required and must be a positive integer"),
            )),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> OrderLimits {
        OrderLimits::default()
    }

    #[test]
    fn add_item_at_quantity_cap_succeeds() {
        let dict = CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", json!("42"))
            .with_slot("quantity", json!(10));
        assert!(CommandDataValidator::validate(&dict, &limits()).is_ok());
    }

    #[test]
    fn add_item_over_quantity_cap_fails_with_business_code() {
        let dict = CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", json!("42"))
            .with_slot("quantity", json!(11));
        let errors = CommandDataValidator::validate(&dict, &limits()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::QuantityExceedsLimit);
        assert_eq!(errors[0].category(), ErrorCategory::Business);
    }

    #[test]
    fn remove_item_without_a_target_fails() {
        let dict = CommandDict::new("REMOVE_ITEM");
        let errors = CommandDataValidator::validate(&dict, &limits()).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn unknown_intent_is_rejected() {
        let dict = CommandDict::new("DANCE");
        let errors = CommandDataValidator::validate(&dict, &limits()).unwrap_err();
        assert_eq!(errors[0].code, ErrorCode::InvalidInputFormat);
    }

    #[test]
    fn clear_order_has_no_required_slots() {
        let dict = CommandDict::new("CLEAR_ORDER");
        assert!(CommandDataValidator::validate(&dict, &limits()).is_ok());
    }
}
