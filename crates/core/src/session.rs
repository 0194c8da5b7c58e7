//! Session and turn-history types (spec §3.1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::order::Order;
use crate::state_machine::ConversationState;

/// Most recent turns kept on the session for classifier context (spec §3.1:
/// "History is truncated to the most recent N (N≈5)").
pub const HISTORY_WINDOW: usize = 5;

/// The session TTL refresh window (spec §3.1, §4.10): ~15 minutes of
/// inactivity before the session is considered expired.
pub const SESSION_TTL_SECONDS: i64 = 15 * 60;

/// One turn appended to conversation history (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub user_input: String,
    pub cleansed_input: String,
    pub intent: crate::command::IntentType,
    pub confidence: f32,
    pub response_text: String,
    pub phrase_type: crate::phrase::PhraseType,
    pub order_state_changed: bool,
    pub ts: DateTime<Utc>,
}

/// Lifecycle status of a session, tracked alongside `conversation_state`.
/// `Active` sessions live in the primary store; `Completed` sessions are
/// archived and removed; `Cancelled` sessions are dropped without archival
/// (spec §9, Open Question 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

/// A session, keyed by `session_id`. Per spec §3.2, `order_id == session_id`
/// always — there is no separate field for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub restaurant_id: String,
    pub status: SessionStatus,
    pub conversation_state: ConversationState,
    #[serde(default)]
    pub order: Order,
    #[serde(default)]
    pub conversation_history: VecDeque<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, restaurant_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            restaurant_id: restaurant_id.into(),
            status: SessionStatus::Active,
            conversation_state: ConversationState::default(),
            order: Order::default(),
            conversation_history: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `order_id` is defined to equal `session_id` (spec §3.1, §9 Open
    /// Question 2).
    pub fn order_id(&self) -> &str {
        &self.session_id
    }

    /// Append a turn, truncating to `HISTORY_WINDOW` most recent entries.
    pub fn record_turn(&mut self, turn: Turn) {
        self.conversation_history.push_back(turn);
        while self.conversation_history.len() > HISTORY_WINDOW {
            self.conversation_history.pop_front();
        }
        self.updated_at = Utc::now();
    }

    /// Recent history for classifier context, oldest first, capped at
    /// `HISTORY_WINDOW` (already enforced by `record_turn`, but a fresh
    /// session loaded from storage may have been written by an older build
    /// with a longer window — re-truncate defensively).
    pub fn recent_history(&self) -> Vec<&Turn> {
        self.conversation_history
            .iter()
            .rev()
            .take(HISTORY_WINDOW)
            .rev()
            .collect()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.updated_at).num_seconds() >= SESSION_TTL_SECONDS
    }
}
