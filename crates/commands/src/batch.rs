//! Derives `CommandBatchResult`'s computed fields from a batch's results
//! (spec §4.7, "BatchAnalysis"). `summary_message` here implements the
//! aggregator's deterministic steps (1, 2, 3, 5, 6); the consolidated
//! clarification question (step 4) is a single join of each clarification's
//! own question — `drivethru-pipeline`'s `ClarificationGenerator` may refine
//! it further when more than one clarification is pending in the same turn.

use std::collections::HashMap;

use drivethru_core::error::{ErrorCategory, ErrorCode};
use drivethru_core::{BatchOutcome, Command, CommandBatchResult, FollowUpAction, IntentType, OrderResult};

pub fn analyze(results: &[OrderResult], commands: &[Command]) -> CommandBatchResult {
    let total_commands = results.len();
    // `failed_commands` and `successful_commands` must sum to `total_commands`
    // (spec §3.2) — a `warning` result counts toward the successful side.
    let failed_commands = results.iter().filter(|r| r.is_error()).count();
    let successful_commands = total_commands - failed_commands;

    let mut errors_by_category: HashMap<ErrorCategory, u32> = HashMap::new();
    let mut errors_by_code: HashMap<ErrorCode, u32> = HashMap::new();
    let mut first_error_code = None;
    for r in results {
        if let Some(category) = r.error_category {
            *errors_by_category.entry(category).or_insert(0) += 1;
        }
        if let Some(code) = r.error_code {
            *errors_by_code.entry(code).or_insert(0) += 1;
            if first_error_code.is_none() {
                first_error_code = Some(code);
            }
        }
    }

    let any_clarification = results.iter().any(is_clarification);
    let any_system_error = results.iter().any(|r| r.error_category == Some(ErrorCategory::System));
    let any_ask_error = results
        .iter()
        .any(|r| matches!(r.error_category, Some(ErrorCategory::Validation) | Some(ErrorCategory::Business)));

    let batch_outcome = if any_clarification {
        BatchOutcome::NeedsClarification
    } else if total_commands > 0 && failed_commands == 0 {
        BatchOutcome::AllSuccess
    } else if total_commands > 0 && successful_commands == 0 {
        BatchOutcome::AllFailed
    } else if any_ask_error {
        BatchOutcome::PartialSuccessAsk
    } else {
        BatchOutcome::PartialSuccessContinue
    };

    let follow_up_action = if any_system_error {
        FollowUpAction::Stop
    } else if any_ask_error || any_clarification {
        FollowUpAction::Ask
    } else {
        FollowUpAction::Continue
    };

    let command_family = dominant_intent(commands);
    let summary_message = build_summary(results);

    CommandBatchResult {
        total_commands,
        successful_commands,
        failed_commands,
        results: results.to_vec(),
        errors_by_category,
        errors_by_code,
        command_family,
        batch_outcome,
        first_error_code,
        summary_message,
        follow_up_action,
    }
}

fn is_clarification(r: &OrderResult) -> bool {
    r.is_success() && r.response_type() == Some("clarification_needed")
}

fn dominant_intent(commands: &[Command]) -> Option<IntentType> {
    let mut counts: HashMap<IntentType, u32> = HashMap::new();
    for c in commands {
        *counts.entry(c.intent_type()).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, n)| *n).map(|(intent, _)| intent)
}

/// Aggregator steps 1, 2, 3, 5, 6 of spec §4.7 (step 4 is a simple join; the
/// full `ClarificationGenerator` lives in `drivethru-pipeline`).
fn build_summary(results: &[OrderResult]) -> String {
    let mut parts: Vec<String> = Vec::new();

    let any_success = results.iter().any(|r| r.is_success() && !is_clarification(r));
    if any_success {
        parts.push("Your order has been updated.".to_string());
    }

    let unavailable: Vec<String> = results
        .iter()
        .filter(|r| matches!(r.error_code, Some(ErrorCode::ItemUnavailable) | Some(ErrorCode::ItemNotFound)))
        .map(|r| {
            r.data
                .as_ref()
                .and_then(|d| d.get("requested_item"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| r.message.clone())
        })
        .collect();
    if !unavailable.is_empty() {
        parts.push(format!("Sorry, we don't have {}.", unavailable.join(", ")));
    }

    let quantity_failures: Vec<String> = results
        .iter()
        .filter(|r| r.error_code == Some(ErrorCode::QuantityExceedsLimit))
        .map(|r| r.message.clone())
        .collect();
    parts.extend(quantity_failures);

    let clarifications: Vec<String> = results.iter().filter(|r| is_clarification(r)).map(|r| r.message.clone()).collect();
    if !clarifications.is_empty() {
        parts.push(clarifications.join(" "));
    }

    if parts.is_empty() {
        return "I'm sorry, I didn't understand. Could you please try again?".to_string();
    }

    if any_success && clarifications.is_empty() && unavailable.is_empty() && quantity_failures_absent(results) {
        parts.push("Would you like anything else?".to_string());
    }

    parts.join(" ")
}

fn quantity_failures_absent(results: &[OrderResult]) -> bool {
    !results.iter().any(|r| r.error_code == Some(ErrorCode::QuantityExceedsLimit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivethru_core::order::Modifier;

    #[test]
    fn all_success_batch() {
        let results = vec![OrderResult::success("Added 1 x Big Mac.")];
        let commands = vec![Command::AddItem {
            menu_item_id: "42".into(),
            quantity: 1,
            size: None,
            modifiers: Vec::<Modifier>::new(),
            special_instructions: None,
        }];
        let batch = analyze(&results, &commands);
        assert!(batch.is_well_formed());
        assert_eq!(batch.batch_outcome, BatchOutcome::AllSuccess);
        assert_eq!(batch.follow_up_action, FollowUpAction::Continue);
        assert_eq!(batch.summary_message, "Your order has been updated. Would you like anything else?");
    }

    #[test]
    fn mixed_batch_is_partial_success_ask() {
        let results = vec![
            OrderResult::success("Added 2 x Big Mac."),
            OrderResult::business_error(ErrorCode::ItemUnavailable, "Sorry, we don't have that item.")
                .with_data(serde_json::json!({ "requested_item": "lobster roll" })),
        ];
        let batch = analyze(&results, &[]);
        assert_eq!(batch.batch_outcome, BatchOutcome::PartialSuccessAsk);
        assert_eq!(batch.follow_up_action, FollowUpAction::Ask);
        assert_eq!(batch.summary_message, "Your order has been updated. Sorry, we don't have lobster roll.");
    }

    #[test]
    fn clarification_outranks_partial_success() {
        let results = vec![OrderResult::success_with_data(
            "Which burger did you want?",
            serde_json::json!({ "response_type": "clarification_needed" }),
        )];
        let batch = analyze(&results, &[]);
        assert_eq!(batch.batch_outcome, BatchOutcome::NeedsClarification);
        assert_eq!(batch.follow_up_action, FollowUpAction::Ask);
    }

    #[test]
    fn all_failed_with_system_error_stops() {
        let results = vec![OrderResult::system_error("db unreachable")];
        let batch = analyze(&results, &[]);
        assert_eq!(batch.batch_outcome, BatchOutcome::AllFailed);
        assert_eq!(batch.follow_up_action, FollowUpAction::Stop);
    }

    #[test]
    fn well_formed_invariant_holds_for_every_shape() {
        let results = vec![
            OrderResult::success("ok"),
            OrderResult::business_error(ErrorCode::ItemNotFound, "nope"),
            OrderResult::warning("already empty"),
        ];
        let batch = analyze(&results, &[]);
        assert!(batch.is_well_formed());
    }
}
