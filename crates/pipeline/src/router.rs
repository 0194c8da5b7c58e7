//! Dispatches an `IntentType` to a parser and returns the `CommandDict`s it
//! produces (spec §4.4). Only the six intents the state machine ever marks
//! `requires_command = true` for reach this router at all — `CONFIRM_ORDER`,
//! `REPEAT`, `SMALL_TALK` and `UNKNOWN` are handled by the orchestrator
//! directly from `Transition.default_phrase_type`.

use std::sync::Arc;

use drivethru_commands::CommandDataValidator;
use drivethru_config::OrderLimits;
use drivethru_core::error::ErrorCode;
use drivethru_core::order::Modifier;
use drivethru_core::{CommandDict, IntentType};
use drivethru_llm::{ExtractedItem, ItemExtractor, ItemResolution, MenuResolver, MutationParser};
use drivethru_menu::MenuCache;

/// What a parser needs for one turn (spec §4.4 "Parser context").
pub struct ParserContext {
    pub restaurant_id: String,
    pub transcript: String,
    pub order_summary: String,
    pub last_mentioned_ref: Option<String>,
    pub limits: OrderLimits,
}

pub struct ParserRouter {
    extractor: Arc<ItemExtractor>,
    resolver: Arc<MenuResolver>,
    mutation: Arc<MutationParser>,
    #[allow(dead_code)]
    menu: Arc<MenuCache>,
}

impl ParserRouter {
    pub fn new(
        extractor: Arc<ItemExtractor>,
        resolver: Arc<MenuResolver>,
        mutation: Arc<MutationParser>,
        menu: Arc<MenuCache>,
    ) -> Self {
        Self { extractor, resolver, mutation, menu }
    }

    pub async fn route(&self, intent: IntentType, ctx: &ParserContext) -> Vec<CommandDict> {
        let dicts = match intent {
            IntentType::AddItem => self.parse_add_item(ctx).await,
            IntentType::RemoveItem => self.parse_mutation("REMOVE_ITEM", ctx).await,
            IntentType::ModifyItem => self.parse_mutation("MODIFY_ITEM", ctx).await,
            IntentType::SetQuantity => self.parse_mutation("SET_QUANTITY", ctx).await,
            IntentType::ClearOrder => vec![CommandDict::new("CLEAR_ORDER")],
            IntentType::Question => {
                vec![CommandDict::new("QUESTION").with_slot("text", serde_json::json!(ctx.transcript))]
            }
            _ => Vec::new(),
        };

        let kept: Vec<CommandDict> = dicts
            .into_iter()
            .filter(|dict| Self::should_keep(dict, &ctx.limits))
            .collect();

        if kept.is_empty() {
            vec![CommandDict::new("UNKNOWN")]
        } else {
            kept
        }
    }

    /// All emitted dicts pass `CommandDataValidator` before the router
    /// returns; invalid ones are dropped with a log (spec §4.4.1). The one
    /// exception is a dict whose only failure is `QUANTITY_EXCEEDS_LIMIT` —
    /// that is a business-threshold result the executor must still surface
    /// verbatim (spec §4.7 scenario 5), not a malformed dict to discard.
    fn should_keep(dict: &CommandDict, limits: &OrderLimits) -> bool {
        match CommandDataValidator::validate(dict, limits) {
            Ok(()) => true,
            Err(errors) => {
                if errors.iter().all(|e| e.code == ErrorCode::QuantityExceedsLimit) {
                    return true;
                }
                tracing::warn!(intent = %dict.intent, errors = ?errors.iter().map(|e| &e.message).collect::<Vec<_>>(), "dropping invalid command dict emitted by parser");
                false
            }
        }
    }

    async fn parse_add_item(&self, ctx: &ParserContext) -> Vec<CommandDict> {
        let extracted = match self.extractor.extract(&ctx.transcript, &ctx.order_summary).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "item extraction failed");
                return Vec::new();
            }
        };

        if extracted.is_empty() {
            return Vec::new();
        }

        let resolutions = futures::future::join_all(
            extracted.iter().map(|item| self.resolver.resolve(&ctx.restaurant_id, item)),
        )
        .await;

        extracted
            .into_iter()
            .zip(resolutions)
            .map(|(item, resolution)| match resolution {
                Ok(resolution) => Self::dict_for_resolution(&item, resolution),
                Err(e) => {
                    tracing::warn!(error = %e, item = %item.item_name, "menu resolution failed");
                    CommandDict::new("ITEM_UNAVAILABLE")
                        .with_slot("requested_item", serde_json::json!(item.item_name))
                        .with_slot("message", serde_json::json!(format!("Sorry, we don't have {}.", item.item_name)))
                }
            })
            .collect()
    }

    fn dict_for_resolution(item: &ExtractedItem, resolution: ItemResolution) -> CommandDict {
        if resolution.is_ambiguous {
            let question = resolution
                .clarification_question
                .unwrap_or_else(|| format!("Which {} did you want?", item.item_name));
            return CommandDict::new("CLARIFICATION_NEEDED")
                .with_slot("ambiguous_item", serde_json::json!(item.item_name))
                .with_slot("clarification_question", serde_json::json!(question))
                .with_slot("suggested_options", serde_json::json!(resolution.suggested_options));
        }

        let Some(menu_item_id) = resolution.menu_item_id.filter(|_| !resolution.is_unavailable) else {
            let message = format!("Sorry, we don't have {}.", item.item_name);
            return CommandDict::new("ITEM_UNAVAILABLE")
                .with_slot("requested_item", serde_json::json!(item.item_name))
                .with_slot("message", serde_json::json!(message));
        };

        let mut dict = CommandDict::new("ADD_ITEM")
            .with_slot("menu_item_id", serde_json::json!(menu_item_id))
            .with_slot("quantity", serde_json::json!(item.quantity));
        if let Some(size) = &item.size {
            dict = dict.with_slot("size", serde_json::json!(size));
        }
        if !item.modifiers.is_empty() {
            let modifiers: Vec<Modifier> = item.modifiers.iter().map(|m| parse_modifier_phrase(m)).collect();
            dict = dict.with_slot("modifiers", serde_json::json!(modifiers));
        }
        if let Some(instructions) = &item.special_instructions {
            dict = dict.with_slot("special_instructions", serde_json::json!(instructions));
        }
        dict
    }

    async fn parse_mutation(&self, intent: &str, ctx: &ParserContext) -> Vec<CommandDict> {
        match self
            .mutation
            .parse(intent, &ctx.transcript, &ctx.order_summary, ctx.last_mentioned_ref.as_deref())
            .await
        {
            Ok(dicts) => dicts,
            Err(e) => {
                tracing::warn!(error = %e, intent, "mutation parsing failed");
                Vec::new()
            }
        }
    }
}

/// Converts a free-form modifier phrase ("no onions", "extra cheese") into a
/// typed `Modifier`. Spec §4.4.1 leaves this conversion unspecified; "no "/
/// "without " prefixes are treated as removals, everything else as an
/// addition with no extra charge (the resolver's tool-using agent is not
/// asked to price modifiers).
fn parse_modifier_phrase(phrase: &str) -> Modifier {
    let lower = phrase.trim().to_lowercase();
    let is_addition = !(lower.starts_with("no ") || lower.starts_with("without "));
    Modifier { name: phrase.trim().to_string(), is_addition, additional_cost: 0.0 }
}
