//! End-to-end checks for spec §8's scenarios, driven at the component level
//! (`ParserRouter` → `CommandExecutor` → `ResponseAggregator`) rather than
//! through `Orchestrator::handle_turn`: `drivethru_store::TtsCache` hardcodes
//! a live `redis::aio::ConnectionManager` with no trait seam, so a turn that
//! reaches `VoiceGenerator` cannot be driven without a reachable Redis
//! instance. These tests exercise the same command pipeline a turn runs,
//! just without the voice-synthesis tail.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use drivethru_commands::{CommandContext, CommandExecutor};
use drivethru_config::{FeatureFlags, OrderLimits};
use drivethru_core::error::Result as CoreResult;
use drivethru_core::llm_types::{FinishReason, GenerateRequest, GenerateResponse, StreamChunk, ToolDefinition};
use drivethru_core::session::SessionStatus;
use drivethru_core::traits::{LanguageModel, OrderArchive, SessionStore};
use drivethru_core::{ConversationState, Ingredient, IntentType, MenuItem, PhraseType, StateMachine};
use drivethru_llm::{ItemExtractor, MenuResolver, MutationParser};
use drivethru_menu::repository::MenuRepository;
use drivethru_menu::{MenuCache, Result as MenuResult};
use drivethru_store::session_store::InMemorySessionStore;
use drivethru_store::SessionRepository;

use crate::response::ResponseAggregator;
use crate::router::{ParserContext, ParserRouter};

/// Fixed menu for all scenarios: three burgers (one line has three matches
/// to drive the ambiguity scenario) plus a coke, nothing unavailable.
struct FixtureMenu;

#[async_trait]
impl MenuRepository for FixtureMenu {
    async fn fetch_menu(&self, restaurant_id: &str) -> MenuResult<Vec<MenuItem>> {
        let item = |id: &str, name: &str, price: f64| MenuItem {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            category_id: "burgers".to_string(),
            name: name.to_string(),
            price,
            is_available: true,
            ingredients: Vec::new(),
            available_sizes: Vec::new(),
        };
        Ok(vec![
            item("1", "Big Mac", 4.5),
            item("2", "Quarter Pounder", 5.0),
            item("3", "McDouble", 3.5),
            item("4", "Coke", 1.5),
        ])
    }

    async fn fetch_ingredients(&self, _restaurant_id: &str, _menu_item_id: &str) -> MenuResult<Vec<Ingredient>> {
        Ok(vec![])
    }
}

fn fixture_menu() -> Arc<MenuCache> {
    Arc::new(MenuCache::new(Arc::new(FixtureMenu)))
}

/// Feeds `ItemExtractor` a fixed extraction response regardless of input.
struct ExtractorLlm(String);

#[async_trait]
impl LanguageModel for ExtractorLlm {
    async fn generate(&self, _request: GenerateRequest) -> CoreResult<GenerateResponse> {
        Ok(GenerateResponse::text(self.0.clone()))
    }

    fn generate_stream<'a>(&'a self, _request: GenerateRequest) -> Pin<Box<dyn futures::Stream<Item = CoreResult<StreamChunk>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }

    async fn generate_with_tools(&self, request: GenerateRequest, _tools: &[ToolDefinition]) -> CoreResult<GenerateResponse> {
        self.generate(request).await
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "extractor-fixture"
    }
}

/// Feeds `MenuResolver` a canned resolution per item name, matched against
/// the candidate-item phrase `MenuResolver::resolve` puts in its prompt. An
/// item name with no entry resolves as unavailable, same as a menu miss.
struct ResolverLlm {
    by_item: HashMap<&'static str, &'static str>,
}

const UNAVAILABLE_JSON: &str =
    r#"{"menu_item_id": null, "resolved_name": null, "is_ambiguous": false, "is_unavailable": true, "confidence": 0.9, "suggested_options": [], "clarification_question": null}"#;

#[async_trait]
impl LanguageModel for ResolverLlm {
    async fn generate(&self, _request: GenerateRequest) -> CoreResult<GenerateResponse> {
        unreachable!("resolver always calls generate_with_tools")
    }

    fn generate_stream<'a>(&'a self, _request: GenerateRequest) -> Pin<Box<dyn futures::Stream<Item = CoreResult<StreamChunk>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }

    async fn generate_with_tools(&self, request: GenerateRequest, _tools: &[ToolDefinition]) -> CoreResult<GenerateResponse> {
        let prompt = request.messages.last().map(|m| m.content.to_lowercase()).unwrap_or_default();
        let body = self
            .by_item
            .iter()
            .find(|(name, _)| prompt.contains(&name.to_lowercase()))
            .map(|(_, body)| *body)
            .unwrap_or(UNAVAILABLE_JSON);
        Ok(GenerateResponse {
            text: body.to_string(),
            finish_reason: FinishReason::Stop,
            usage: None,
            tool_calls: vec![],
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "resolver-fixture"
    }
}

fn router(extraction_body: &str, resolutions: HashMap<&'static str, &'static str>) -> ParserRouter {
    let menu = fixture_menu();
    let extractor = Arc::new(ItemExtractor::new(Arc::new(ExtractorLlm(extraction_body.to_string()))));
    let resolver = Arc::new(MenuResolver::new(Arc::new(ResolverLlm { by_item: resolutions }), menu.clone()));
    let mutation = Arc::new(MutationParser::new(Arc::new(ResolverLlm { by_item: HashMap::new() })));
    ParserRouter::new(extractor, resolver, mutation, menu)
}

fn ctx(transcript: &str) -> ParserContext {
    ParserContext {
        restaurant_id: "r1".to_string(),
        transcript: transcript.to_string(),
        order_summary: "Your order is currently empty.".to_string(),
        last_mentioned_ref: None,
        limits: OrderLimits::default(),
    }
}

fn cmd_ctx(menu: Arc<MenuCache>, limits: OrderLimits) -> CommandContext {
    CommandContext::new("session-1", "r1", menu, limits, FeatureFlags::default())
}

const BIG_MAC_RESOLVED: &str =
    r#"{"menu_item_id": "1", "resolved_name": "Big Mac", "is_ambiguous": false, "is_unavailable": false, "confidence": 0.95, "suggested_options": [], "clarification_question": null}"#;

#[tokio::test]
async fn scenario_one_clear_add_single_item() {
    let extraction = r#"{"items": [{"item_name": "big mac", "quantity": 1, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.95}]}"#;
    let router = router(extraction, HashMap::from([("big mac", BIG_MAC_RESOLVED)]));
    let menu = fixture_menu();

    let dicts = router.route(IntentType::AddItem, &ctx("I'll have a big mac")).await;
    let (batch, _order) = CommandExecutor::execute_batch(dicts, &cmd_ctx(menu, OrderLimits::default()), Default::default()).await;
    let (text, phrase) = ResponseAggregator::compose(&batch);

    assert_eq!(text, "Your order has been updated. Would you like anything else?");
    assert_eq!(phrase, PhraseType::ItemAddedSuccess);
}

#[tokio::test]
async fn scenario_two_ambiguity_asks_for_clarification() {
    let extraction = r#"{"items": [{"item_name": "burger", "quantity": 1, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.9}]}"#;
    let ambiguous = r#"{"menu_item_id": null, "resolved_name": null, "is_ambiguous": true, "is_unavailable": false, "confidence": 0.5, "suggested_options": ["Big Mac", "Quarter Pounder", "McDouble"], "clarification_question": "Which burger did you want?"}"#;
    let router = router(extraction, HashMap::from([("burger", ambiguous)]));
    let menu = fixture_menu();

    let dicts = router.route(IntentType::AddItem, &ctx("I want a burger")).await;
    let (batch, _order) = CommandExecutor::execute_batch(dicts, &cmd_ctx(menu, OrderLimits::default()), Default::default()).await;
    let (text, phrase) = ResponseAggregator::compose(&batch);

    assert_eq!(text, "Which burger did you want? We have Big Mac, Quarter Pounder, or McDouble.");
    assert_eq!(phrase, PhraseType::ClarificationQuestion);
}

#[tokio::test]
async fn scenario_three_unavailable_item_fails_the_whole_batch() {
    let extraction = r#"{"items": [{"item_name": "lobster roll", "quantity": 1, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.92}]}"#;
    let router = router(extraction, HashMap::new());
    let menu = fixture_menu();

    let dicts = router.route(IntentType::AddItem, &ctx("I'll have a lobster roll")).await;
    let (batch, _order) = CommandExecutor::execute_batch(dicts, &cmd_ctx(menu, OrderLimits::default()), Default::default()).await;
    let (text, phrase) = ResponseAggregator::compose(&batch);

    assert_eq!(text, "Sorry, we don't have lobster roll.");
    assert_eq!(phrase, PhraseType::ItemUnavailable);
    assert!(batch.batch_outcome == drivethru_core::BatchOutcome::AllFailed);
}

#[tokio::test]
async fn scenario_four_mixed_batch_partially_succeeds() {
    let extraction = r#"{"items": [
        {"item_name": "big mac", "quantity": 2, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.95},
        {"item_name": "lobster roll", "quantity": 1, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.9}
    ]}"#;
    let router = router(extraction, HashMap::from([("big mac", BIG_MAC_RESOLVED)]));
    let menu = fixture_menu();

    let dicts = router.route(IntentType::AddItem, &ctx("Two big macs and a lobster roll")).await;
    let (batch, _order) = CommandExecutor::execute_batch(dicts, &cmd_ctx(menu, OrderLimits::default()), Default::default()).await;
    let (text, phrase) = ResponseAggregator::compose(&batch);

    assert_eq!(text, "Your order has been updated. Sorry, we don't have lobster roll.");
    assert_eq!(phrase, PhraseType::CustomResponse);
    assert!(batch.batch_outcome == drivethru_core::BatchOutcome::PartialSuccessAsk);
}

#[tokio::test]
async fn scenario_five_quantity_over_cap_reports_the_validator_message() {
    let extraction = r#"{"items": [{"item_name": "coke", "quantity": 11, "size": null, "modifiers": [], "special_instructions": null, "confidence": 0.9}]}"#;
    let resolved_coke = r#"{"menu_item_id": "4", "resolved_name": "Coke", "is_ambiguous": false, "is_unavailable": false, "confidence": 0.95, "suggested_options": [], "clarification_question": null}"#;
    let router = router(extraction, HashMap::from([("coke", resolved_coke)]));
    let menu = fixture_menu();
    let limits = OrderLimits { max_quantity_per_item: 10, ..OrderLimits::default() };

    let dicts = router.route(IntentType::AddItem, &ctx("give me eleven cokes")).await;
    let (batch, _order) = CommandExecutor::execute_batch(dicts, &cmd_ctx(menu, limits), Default::default()).await;
    let (text, phrase) = ResponseAggregator::compose(&batch);

    assert_eq!(text, "quantity 11 exceeds the maximum of 10 per item");
    assert_eq!(phrase, PhraseType::QuantityTooHigh);
}

struct CountingArchive {
    archived: AtomicI64,
}

#[async_trait]
impl OrderArchive for CountingArchive {
    async fn archive_completed_order(&self, _session: &drivethru_core::session::Session) -> CoreResult<i64> {
        Ok(self.archived.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[tokio::test]
async fn scenario_six_confirm_flow_archives_and_clears_the_session() {
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let archive = Arc::new(CountingArchive { archived: AtomicI64::new(0) });
    let repo = SessionRepository::new(store, archive.clone());

    let session = repo.handle_new_car("r1").await.unwrap();
    assert_eq!(session.conversation_state, ConversationState::Idle);

    // Turn 1: ORDERING -> CONFIRMING on CONFIRM_ORDER, no commands required.
    let to_confirming = StateMachine::get_transition(ConversationState::Ordering, IntentType::ConfirmOrder);
    assert!(!to_confirming.requires_command);
    assert_eq!(to_confirming.target_state, ConversationState::Confirming);
    assert_eq!(to_confirming.default_phrase_type, PhraseType::OrderSummary);

    let after_summary = repo
        .update_session(&session.session_id, serde_json::json!({ "conversation_state": to_confirming.target_state }))
        .await
        .unwrap();
    assert_eq!(after_summary.conversation_state, ConversationState::Confirming);
    assert_eq!(archive.archived.load(Ordering::SeqCst), 0);

    // Turn 2: CONFIRMING -> CLOSING on CONFIRM_ORDER, which archives and clears.
    let to_closing = StateMachine::get_transition(ConversationState::Confirming, IntentType::ConfirmOrder);
    assert_eq!(to_closing.target_state, ConversationState::Closing);
    assert_eq!(to_closing.default_phrase_type, PhraseType::OrderComplete);

    let closed = repo
        .update_session(
            &session.session_id,
            serde_json::json!({ "conversation_state": to_closing.target_state, "status": "COMPLETED" }),
        )
        .await
        .unwrap();
    assert_eq!(closed.status, SessionStatus::Completed);
    assert_eq!(archive.archived.load(Ordering::SeqCst), 1);
    assert!(repo.get_current_session().await.unwrap().is_none());
}
