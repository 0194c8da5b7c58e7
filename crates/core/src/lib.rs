//! Domain model and trait boundaries for the drive-thru conversation core.
//!
//! This crate has no dependency on any other workspace crate: it defines the
//! entities every other crate operates on (orders, sessions, commands,
//! results), the finite state machine governing legal intents per
//! conversational state, the canned-phrase catalog, and the async trait
//! boundaries (`LanguageModel`, `SpeechToText`, `TextToSpeech`, `SessionStore`,
//! `OrderArchive`, `ObjectStore`) that every backend-specific crate implements.

pub mod command;
pub mod error;
pub mod llm_types;
pub mod order;
pub mod phrase;
pub mod session;
pub mod state_machine;
pub mod traits;

pub use command::{
    BatchOutcome, Command, CommandBatchResult, CommandDict, FollowUpAction, IntentType,
    OrderResult, OrderResultStatus,
};
pub use error::{CoreError, ErrorCategory, ErrorCode, Result};
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, StreamChunk, TokenUsage,
    ToolCall, ToolDefinition,
};
pub use order::{Ingredient, Inventory, LineItem, MenuItem, Modifier, Order};
pub use phrase::PhraseType;
pub use session::{Session, SessionStatus, Turn};
pub use state_machine::{ConversationState, StateMachine, Transition};
pub use traits::{LanguageModel, ObjectStore, OrderArchive, SessionStore, SpeechToText, TextToSpeech};
