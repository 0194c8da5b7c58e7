//! Wires one conversational turn end to end (spec §4, §5): safety gate,
//! intent classification, the state machine, parser routing, command
//! execution and voice generation, writing the updated session back through
//! `SessionRepository`.
//!
//! Per-session turns are serialized through `locks` (spec §5.4: concurrent
//! turns on the same session return a soft 409 rather than racing each
//! other) and the whole turn runs under a single end-to-end budget (spec
//! §5.5), beyond which the turn gives up and answers `COME_AGAIN` rather
//! than hang the caller.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use drivethru_commands::{CommandContext, CommandExecutor};
use drivethru_config::Settings;
use drivethru_core::error::CoreError;
use drivethru_core::order::Order;
use drivethru_core::session::{Session, SessionStatus, Turn};
use drivethru_core::{CommandDict, ConversationState, IntentType, PhraseType, StateMachine, Transition};
use drivethru_llm::{IntentClassificationResult, IntentClassifier};
use drivethru_menu::MenuCache;
use drivethru_safety::SafetyGate;
use drivethru_store::SessionRepository;

use crate::response::ResponseAggregator;
use crate::router::{ParserContext, ParserRouter};
use crate::voice::VoiceGenerator;
use crate::PipelineError;

const DEFAULT_PER_CALL_TIMEOUT_SECONDS: u64 = 10;

/// What one turn hands back to the HTTP layer.
pub struct TurnOutcome {
    pub response_text: String,
    pub phrase_type: PhraseType,
    pub intent: IntentType,
    pub audio_url: String,
    pub session: Session,
}

pub struct Orchestrator {
    safety: SafetyGate,
    classifier: IntentClassifier,
    router: ParserRouter,
    voice: VoiceGenerator,
    sessions: Arc<SessionRepository>,
    menu: Arc<MenuCache>,
    settings: Settings,
    per_call_timeout: Duration,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Orchestrator {
    pub fn new(
        safety: SafetyGate,
        classifier: IntentClassifier,
        router: ParserRouter,
        voice: VoiceGenerator,
        sessions: Arc<SessionRepository>,
        menu: Arc<MenuCache>,
        settings: Settings,
    ) -> Self {
        Self {
            safety,
            classifier,
            router,
            voice,
            sessions,
            menu,
            settings,
            per_call_timeout: Duration::from_secs(DEFAULT_PER_CALL_TIMEOUT_SECONDS),
            locks: DashMap::new(),
        }
    }

    /// Audio URL for the greeting played when a session opens (spec §6.1
    /// `POST /sessions/new-car`'s `greeting_audio_url`).
    pub async fn greeting_audio(&self, restaurant_id: &str) -> Result<String, PipelineError> {
        Ok(self.voice.generate(PhraseType::Greeting, restaurant_id, None, false).await?)
    }

    /// Runs one turn for `session_id`. Returns `PipelineError::SessionBusy`
    /// if another turn for the same session is already in flight.
    pub async fn handle_turn(&self, session_id: &str, transcript: &str) -> Result<TurnOutcome, PipelineError> {
        let lock = self.locks.entry(session_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        let _guard = lock.try_lock().map_err(|_| PipelineError::SessionBusy(session_id.to_string()))?;

        let turn_budget = Duration::from_secs(self.settings.server.timeout_seconds);
        match tokio::time::timeout(turn_budget, self.run_turn(session_id, transcript)).await {
            Ok(outcome) => outcome,
            Err(_) => self.timeout_fallback(session_id).await,
        }
    }

    async fn run_turn(&self, session_id: &str, transcript: &str) -> Result<TurnOutcome, PipelineError> {
        let session = self.fetch_session(session_id).await?;

        let verdict = self.safety.evaluate(transcript);
        if verdict.blocked {
            tracing::warn!(session_id, score = verdict.score, signals = ?verdict.signals, "blocked unsafe transcript");
            return self
                .finish_turn(session, transcript, transcript, IntentType::Unknown, 0.0, PhraseType::CantHelpRightNow, PhraseType::CantHelpRightNow.fallback_text().to_string(), false, false)
                .await;
        }

        let sanitized = self.safety.sanitize(transcript);
        let history: Vec<String> = session.recent_history().iter().map(|t| t.cleansed_input.clone()).collect();
        let order_summary = summarize_order(&session.order);

        let classification = tokio::time::timeout(
            self.per_call_timeout,
            self.classifier.classify(&sanitized, &history, &order_summary, state_key(session.conversation_state)),
        )
        .await
        .unwrap_or_else(|_| IntentClassificationResult { intent: IntentType::Unknown, confidence: 0.1, cleansed_input: sanitized.clone() });

        let transition = StateMachine::get_transition(session.conversation_state, classification.intent);
        let low_confidence = classification.confidence < self.settings.ai_confidence_threshold;

        if !transition.requires_command {
            let mut session = session;
            let (response_text, phrase_type) = self.compose_non_command_response(&session, &transition);
            session.conversation_state = transition.target_state;
            return self
                .finish_turn(session, transcript, &classification.cleansed_input, classification.intent, classification.confidence, phrase_type, response_text, low_confidence, false)
                .await;
        }

        let mut session = session;
        let limits = self.settings.order_limits.clone();
        let ctx = ParserContext {
            restaurant_id: session.restaurant_id.clone(),
            transcript: sanitized,
            order_summary,
            last_mentioned_ref: session.order.last_mentioned_item_ref.clone(),
            limits: limits.clone(),
        };

        let dicts = tokio::time::timeout(self.per_call_timeout, self.router.route(classification.intent, &ctx))
            .await
            .unwrap_or_else(|_| vec![CommandDict::new("UNKNOWN")]);

        let cmd_ctx = CommandContext::new(session.session_id.clone(), session.restaurant_id.clone(), self.menu.clone(), limits, self.settings.features.clone());
        let working_order = std::mem::take(&mut session.order);
        let (batch, new_order) = CommandExecutor::execute_batch(dicts, &cmd_ctx, working_order).await;
        session.order = new_order;
        session.conversation_state = transition.target_state;

        let (response_text, phrase_type) = ResponseAggregator::compose(&batch);
        let order_state_changed = batch.successful_commands > 0;

        self.finish_turn(
            session,
            transcript,
            &classification.cleansed_input,
            classification.intent,
            classification.confidence,
            phrase_type,
            response_text,
            low_confidence,
            order_state_changed,
        )
        .await
    }

    /// Builds the response for the four intents that never reach
    /// `ParserRouter` plus any invalid `(state, intent)` cell — both cases
    /// are answered straight from `Transition.default_phrase_type` (spec
    /// §4.3). `OrderSummary` and `OrderRepeat` need the live order, not the
    /// phrase catalog's generic fallback text.
    fn compose_non_command_response(&self, session: &Session, transition: &Transition) -> (String, PhraseType) {
        let phrase_type = transition.default_phrase_type;
        let text = match phrase_type {
            PhraseType::OrderSummary | PhraseType::OrderRepeat => summarize_order(&session.order),
            PhraseType::OrderComplete => format!("{} Your total was {}.", phrase_type.fallback_text(), format_total(session.order.total())),
            _ => phrase_type.fallback_text().to_string(),
        };
        (text, phrase_type)
    }

    /// Appends turn history, persists the session (archiving and clearing it
    /// when the turn just transitioned to `Closing`), and generates the
    /// response audio. The spoken text and the text returned to the caller
    /// are derived from the exact same `VoiceGenerator::resolve_text` call,
    /// so a low-confidence repeat prompt never shows up in audio but not in
    /// the transcript, or vice versa.
    #[allow(clippy::too_many_arguments)]
    async fn finish_turn(
        &self,
        mut session: Session,
        raw_transcript: &str,
        cleansed_input: &str,
        intent: IntentType,
        confidence: f32,
        phrase_type: PhraseType,
        response_text_base: String,
        low_confidence: bool,
        order_state_changed: bool,
    ) -> Result<TurnOutcome, PipelineError> {
        let custom_text = if phrase_type.is_dynamic() { Some(response_text_base.as_str()) } else { None };
        let response_text = VoiceGenerator::resolve_text(phrase_type, custom_text, low_confidence);

        let audio_url = tokio::time::timeout(self.per_call_timeout, self.voice.generate(phrase_type, &session.restaurant_id, custom_text, low_confidence))
            .await
            .map_err(|_| PipelineError::TurnTimedOut)??;

        session.record_turn(Turn {
            user_input: raw_transcript.to_string(),
            cleansed_input: cleansed_input.to_string(),
            intent,
            confidence,
            response_text: response_text.clone(),
            phrase_type,
            order_state_changed,
            ts: chrono::Utc::now(),
        });

        let closing = session.conversation_state == ConversationState::Closing;
        let mut patch = serde_json::json!({
            "conversation_state": session.conversation_state,
            "order": session.order,
            "conversation_history": session.conversation_history,
        });
        if closing {
            patch["status"] = serde_json::json!(SessionStatus::Completed);
        }

        let updated = self.sessions.update_session(&session.session_id, patch).await?;

        Ok(TurnOutcome { response_text, phrase_type, intent, audio_url, session: updated })
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Session, PipelineError> {
        match self.sessions.get_current_session().await? {
            Some(session) if session.session_id == session_id => Ok(session),
            _ => Err(PipelineError::Core(CoreError::NotCurrentSession(session_id.to_string()))),
        }
    }

    /// Best-effort response when a turn blows through its end-to-end budget
    /// (spec §5.5): no command work is trusted enough to persist, so this
    /// reports `COME_AGAIN` against whatever the session already was
    /// without writing anything back.
    async fn timeout_fallback(&self, session_id: &str) -> Result<TurnOutcome, PipelineError> {
        tracing::warn!(session_id, "turn exceeded its time budget");
        let session = self.fetch_session(session_id).await?;
        let phrase_type = PhraseType::ComeAgain;
        let response_text = VoiceGenerator::resolve_text(phrase_type, None, false);
        let audio_url = self.voice.generate(phrase_type, &session.restaurant_id, None, false).await?;
        Ok(TurnOutcome { response_text, phrase_type, intent: IntentType::Unknown, audio_url, session })
    }
}

fn state_key(state: ConversationState) -> &'static str {
    match state {
        ConversationState::Idle => "IDLE",
        ConversationState::Ordering => "ORDERING",
        ConversationState::Thinking => "THINKING",
        ConversationState::Clarifying => "CLARIFYING",
        ConversationState::Confirming => "CONFIRMING",
        ConversationState::Closing => "CLOSING",
    }
}

fn summarize_order(order: &Order) -> String {
    if order.is_empty() {
        return "Your order is currently empty.".to_string();
    }
    let items: Vec<String> = order.line_items.iter().map(|li| format!("{} x {}", li.quantity, li.name)).collect();
    format!("You have {} for a total of {}.", items.join(", "), format_total(order.total()))
}

fn format_total(total: f64) -> String {
    format!("${total:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivethru_core::order::LineItem;

    #[test]
    fn empty_order_has_a_dedicated_summary() {
        assert_eq!(summarize_order(&Order::default()), "Your order is currently empty.");
    }

    #[test]
    fn summary_lists_items_and_total() {
        let mut order = Order::default();
        order.add(LineItem::new("line-1", "mi-1", "Big Mac", 2, 5.0));
        let summary = summarize_order(&order);
        assert!(summary.contains("2 x Big Mac"));
        assert!(summary.contains("$10.00"));
    }
}
