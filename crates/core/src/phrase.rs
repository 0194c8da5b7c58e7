//! The canned-phrase catalog (spec §4.8, GLOSSARY "Canned phrase").
//!
//! Transcribed from `original_source/backend/app/constants/audio_phrases.py`:
//! a fixed set of phrase identifiers, each with English fallback text used
//! when no pre-rendered audio file exists yet for a given restaurant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhraseType {
    Greeting,
    WelcomeMenu,
    TakeYourTime,
    ComeAgain,
    NoOrderYet,
    NoActiveOrder,
    AddItemsFirst,
    OrderBeingPrepared,
    CantHelpRightNow,
    ItemAddedSuccess,
    ItemRemoved,
    ItemModified,
    QuantityUpdated,
    OrderCleared,
    ItemUnavailable,
    QuantityTooHigh,
    ClarificationQuestion,
    QuestionAnswered,
    OrderSummary,
    OrderRepeat,
    OrderConfirm,
    OrderComplete,
    DidntUnderstand,
    /// Forces the TTS path rather than a canned file (spec §4.7): used
    /// whenever the aggregator composed mixed-outcome text that has no
    /// fixed script.
    CustomResponse,
}

impl PhraseType {
    /// English fallback text, used when a canned file has not been
    /// pre-rendered for a restaurant yet and no dynamic text was supplied.
    pub fn fallback_text(&self) -> &'static str {
        use PhraseType::*;
        match self {
            Greeting => "Welcome! What can I get started for you today?",
            WelcomeMenu => "Welcome! Feel free to ask about our menu or place an order.",
            TakeYourTime => "Take your time, I'm here whenever you're ready.",
            ComeAgain => "Sorry, could you say that again?",
            NoOrderYet => "You don't have anything in your order yet. What can I get you?",
            NoActiveOrder => "There's no active order right now. What can I get started for you?",
            AddItemsFirst => "Please add at least one item before confirming your order.",
            OrderBeingPrepared => "Your order is already being prepared, but I can still add one more item.",
            CantHelpRightNow => "Sorry, I can't help with that right now.",
            ItemAddedSuccess => "Your order has been updated.",
            ItemRemoved => "I've removed that from your order.",
            ItemModified => "I've updated that item.",
            QuantityUpdated => "I've updated the quantity.",
            OrderCleared => "Your order has been cleared.",
            ItemUnavailable => "Sorry, we don't have that item.",
            QuantityTooHigh => "Sorry, that's more than we allow per item.",
            ClarificationQuestion => "Could you clarify which item you meant?",
            QuestionAnswered => "Here's what I found.",
            OrderSummary => "Here's your order so far. Would you like anything else?",
            OrderRepeat => "Let me repeat your order.",
            OrderConfirm => "Your order is confirmed.",
            OrderComplete => "Your order is complete. Please pull up to the window.",
            DidntUnderstand => "I'm sorry, I didn't understand. Could you please try again?",
            CustomResponse => "",
        }
    }

    /// Phrase types whose content genuinely varies turn to turn and must
    /// always go through TTS rather than a pre-rendered file (spec §4.8).
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            PhraseType::CustomResponse
                | PhraseType::ItemUnavailable
                | PhraseType::ClarificationQuestion
                | PhraseType::QuantityTooHigh
                | PhraseType::QuestionAnswered
                | PhraseType::OrderSummary
                | PhraseType::OrderRepeat
                | PhraseType::OrderComplete
                | PhraseType::OrderConfirm
        )
    }

    /// Lowercase identifier used in object-store paths and filenames
    /// (`canned-phrases/restaurant-{id}/{phrase_type}.mp3`).
    pub fn as_key(&self) -> &'static str {
        use PhraseType::*;
        match self {
            Greeting => "greeting",
            WelcomeMenu => "welcome_menu",
            TakeYourTime => "take_your_time",
            ComeAgain => "come_again",
            NoOrderYet => "no_order_yet",
            NoActiveOrder => "no_active_order",
            AddItemsFirst => "add_items_first",
            OrderBeingPrepared => "order_being_prepared",
            CantHelpRightNow => "cant_help_right_now",
            ItemAddedSuccess => "item_added_success",
            ItemRemoved => "item_removed",
            ItemModified => "item_modified",
            QuantityUpdated => "quantity_updated",
            OrderCleared => "order_cleared",
            ItemUnavailable => "item_unavailable",
            QuantityTooHigh => "quantity_too_high",
            ClarificationQuestion => "clarification_question",
            QuestionAnswered => "question_answered",
            OrderSummary => "order_summary",
            OrderRepeat => "order_repeat",
            OrderConfirm => "order_confirm",
            OrderComplete => "order_complete",
            DidntUnderstand => "didnt_understand",
            CustomResponse => "custom_response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_response_is_always_dynamic() {
        assert!(PhraseType::CustomResponse.is_dynamic());
    }

    #[test]
    fn canned_phrases_have_non_empty_fallback_text() {
        for p in [
            PhraseType::Greeting,
            PhraseType::WelcomeMenu,
            PhraseType::CantHelpRightNow,
            PhraseType::DidntUnderstand,
        ] {
            assert!(!p.fallback_text().is_empty());
        }
    }
}
