//! The finite state machine governing legal intents per conversational
//! state (spec §4.3). The full table is transcribed from
//! `original_source/backend/app/core/state_machine.py`, which is strictly
//! more complete than the distilled prose in spec.md (it covers every
//! `SMALL_TALK`/`REPEAT` cell the prose glosses over) — those extra cells
//! are carried here since they complete spec.md rather than contradict it.

use serde::{Deserialize, Serialize};

use crate::command::IntentType;
use crate::phrase::PhraseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    #[default]
    Idle,
    Ordering,
    Thinking,
    Clarifying,
    Confirming,
    Closing,
}

/// One cell of the transition table (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub is_valid: bool,
    pub target_state: ConversationState,
    pub requires_command: bool,
    pub default_phrase_type: PhraseType,
}

impl Transition {
    const fn valid(target: ConversationState, requires_command: bool, phrase: PhraseType) -> Self {
        Self {
            is_valid: true,
            target_state: target,
            requires_command,
            default_phrase_type: phrase,
        }
    }

    const fn invalid(current: ConversationState, phrase: PhraseType) -> Self {
        Self {
            is_valid: false,
            target_state: current,
            requires_command: false,
            default_phrase_type: phrase,
        }
    }

    /// The sentinel returned for an unmodeled `(state, intent)` pair (spec
    /// §4.3, §8: "unknown pairs return the explicit CANT_HELP_RIGHT_NOW
    /// sentinel"). The table below is total, so this is unreachable in
    /// practice — it exists so the function signature is honest about the
    /// guarantee it makes.
    const fn fallback(current: ConversationState) -> Self {
        Self::invalid(current, PhraseType::CantHelpRightNow)
    }
}

/// Stateless FSM: `(state, intent) -> Transition` is a pure total function.
pub struct StateMachine;

impl StateMachine {
    /// Look up the transition for a `(state, intent)` pair. Never panics;
    /// every cell is modeled explicitly.
    pub fn get_transition(state: ConversationState, intent: IntentType) -> Transition {
        use ConversationState::*;
        use IntentType::*;
        use PhraseType::*;

        match (state, intent) {
            // ---------------- ORDERING ----------------
            (Ordering, AddItem) => Transition::valid(Ordering, true, ItemAddedSuccess),
            (Ordering, RemoveItem) => Transition::valid(Ordering, true, ItemRemoved),
            (Ordering, ModifyItem) => Transition::valid(Ordering, true, ItemModified),
            (Ordering, SetQuantity) => Transition::valid(Ordering, true, QuantityUpdated),
            (Ordering, ClearOrder) => Transition::valid(Ordering, true, OrderCleared),
            (Ordering, ConfirmOrder) => Transition::valid(Confirming, false, OrderSummary),
            (Ordering, Repeat) => Transition::valid(Ordering, false, OrderRepeat),
            (Ordering, Question) => Transition::valid(Clarifying, true, QuestionAnswered),
            (Ordering, SmallTalk) => Transition::valid(Ordering, false, TakeYourTime),
            (Ordering, Unknown) => Transition::valid(Clarifying, false, ComeAgain),

            // ---------------- THINKING ----------------
            // Order mutations other than ADD_ITEM are invalid: nothing has
            // been ordered yet.
            (Thinking, AddItem) => Transition::valid(Ordering, true, ItemAddedSuccess),
            (Thinking, RemoveItem)
            | (Thinking, ModifyItem)
            | (Thinking, SetQuantity)
            | (Thinking, ClearOrder)
            | (Thinking, ConfirmOrder) => Transition::invalid(Thinking, NoOrderYet),
            (Thinking, Repeat) => Transition::valid(Thinking, false, NoOrderYet),
            (Thinking, Question) => Transition::valid(Clarifying, true, QuestionAnswered),
            (Thinking, SmallTalk) => Transition::valid(Thinking, false, TakeYourTime),
            (Thinking, Unknown) => Transition::valid(Clarifying, false, ComeAgain),

            // ---------------- CLARIFYING ----------------
            // Any order mutation resolves the ambiguity and reopens ordering.
            (Clarifying, AddItem) => Transition::valid(Ordering, true, ItemAddedSuccess),
            (Clarifying, RemoveItem) => Transition::valid(Ordering, true, ItemRemoved),
            (Clarifying, ModifyItem) => Transition::valid(Ordering, true, ItemModified),
            (Clarifying, SetQuantity) => Transition::valid(Ordering, true, QuantityUpdated),
            (Clarifying, ClearOrder) => Transition::valid(Ordering, true, OrderCleared),
            (Clarifying, ConfirmOrder) => Transition::invalid(Clarifying, AddItemsFirst),
            (Clarifying, Repeat) => Transition::valid(Clarifying, false, ClarificationQuestion),
            (Clarifying, Question) => Transition::valid(Clarifying, true, QuestionAnswered),
            (Clarifying, SmallTalk) => Transition::valid(Clarifying, false, TakeYourTime),
            (Clarifying, Unknown) => Transition::valid(Clarifying, false, ComeAgain),

            // ---------------- CONFIRMING ----------------
            // Any further mutation re-opens the order.
            (Confirming, AddItem) => Transition::valid(Ordering, true, ItemAddedSuccess),
            (Confirming, RemoveItem) => Transition::valid(Ordering, true, ItemRemoved),
            (Confirming, ModifyItem) => Transition::valid(Ordering, true, ItemModified),
            (Confirming, SetQuantity) => Transition::valid(Ordering, true, QuantityUpdated),
            (Confirming, ClearOrder) => Transition::valid(Ordering, true, OrderCleared),
            (Confirming, ConfirmOrder) => Transition::valid(Closing, false, OrderComplete),
            (Confirming, Repeat) => Transition::valid(Confirming, false, OrderSummary),
            (Confirming, Question) => Transition::valid(Confirming, true, QuestionAnswered),
            (Confirming, SmallTalk) => Transition::valid(Confirming, false, TakeYourTime),
            (Confirming, Unknown) => Transition::valid(Confirming, false, ComeAgain),

            // ---------------- CLOSING ----------------
            // The order is already headed to the kitchen; only ADD_ITEM can
            // still sneak in.
            (Closing, AddItem) => Transition::valid(Ordering, true, ItemAddedSuccess),
            (Closing, RemoveItem)
            | (Closing, ModifyItem)
            | (Closing, SetQuantity)
            | (Closing, ClearOrder)
            | (Closing, ConfirmOrder) => Transition::invalid(Closing, OrderBeingPrepared),
            (Closing, Repeat) => Transition::valid(Closing, false, OrderSummary),
            (Closing, Question) => Transition::valid(Closing, true, QuestionAnswered),
            (Closing, SmallTalk) => Transition::valid(Closing, false, OrderComplete),
            (Closing, Unknown) => Transition::valid(Closing, false, ComeAgain),

            // ---------------- IDLE ----------------
            // No order exists yet; every mutation is invalid.
            (Idle, AddItem)
            | (Idle, RemoveItem)
            | (Idle, ModifyItem)
            | (Idle, SetQuantity)
            | (Idle, ClearOrder)
            | (Idle, ConfirmOrder) => Transition::invalid(Idle, NoActiveOrder),
            (Idle, Repeat) => Transition::invalid(Idle, NoActiveOrder),
            (Idle, Question) | (Idle, SmallTalk) | (Idle, Unknown) => {
                Transition::valid(Thinking, false, WelcomeMenu)
            }
        }
    }

    /// Apply the transition to a state without mutating anything — callers
    /// persist the result themselves (spec §4.3: "Failure to persist is
    /// logged, not fatal").
    pub fn is_valid_transition(state: ConversationState, intent: IntentType) -> bool {
        Self::get_transition(state, intent).is_valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_over_all_state_intent_pairs() {
        let states = [
            ConversationState::Idle,
            ConversationState::Ordering,
            ConversationState::Thinking,
            ConversationState::Clarifying,
            ConversationState::Confirming,
            ConversationState::Closing,
        ];
        for state in states {
            for intent in IntentType::ALL {
                // Must not panic: every cell is modeled.
                let _ = StateMachine::get_transition(state, intent);
            }
        }
    }

    #[test]
    fn confirm_order_flow_matches_scenario_six() {
        let t1 = StateMachine::get_transition(ConversationState::Ordering, IntentType::ConfirmOrder);
        assert!(t1.is_valid);
        assert_eq!(t1.target_state, ConversationState::Confirming);
        assert!(!t1.requires_command);
        assert_eq!(t1.default_phrase_type, PhraseType::OrderSummary);

        let t2 = StateMachine::get_transition(ConversationState::Confirming, IntentType::ConfirmOrder);
        assert_eq!(t2.target_state, ConversationState::Closing);
        assert_eq!(t2.default_phrase_type, PhraseType::OrderComplete);
    }

    #[test]
    fn thinking_rejects_mutations_other_than_add_item() {
        let t = StateMachine::get_transition(ConversationState::Thinking, IntentType::RemoveItem);
        assert!(!t.is_valid);
        assert_eq!(t.target_state, ConversationState::Thinking);
        assert_eq!(t.default_phrase_type, PhraseType::NoOrderYet);
    }

    #[test]
    fn closing_allows_add_item_but_rejects_other_mutations() {
        let add = StateMachine::get_transition(ConversationState::Closing, IntentType::AddItem);
        assert!(add.is_valid);
        assert_eq!(add.target_state, ConversationState::Ordering);

        let remove = StateMachine::get_transition(ConversationState::Closing, IntentType::RemoveItem);
        assert!(!remove.is_valid);
        assert_eq!(remove.default_phrase_type, PhraseType::OrderBeingPrepared);
    }

    #[test]
    fn idle_routes_non_mutating_intents_to_thinking() {
        for intent in [IntentType::Question, IntentType::SmallTalk, IntentType::Unknown] {
            let t = StateMachine::get_transition(ConversationState::Idle, intent);
            assert!(t.is_valid);
            assert_eq!(t.target_state, ConversationState::Thinking);
        }
    }
}
