//! Turn orchestration for the drive-thru conversation core.
//!
//! Wires the pure domain crate (`drivethru-core`), the safety gate, the
//! LLM-backed parsers, the menu cache, the command pipeline and the
//! persistence layer into the single end-to-end operation the server crate
//! calls once per customer utterance: [`orchestrator::Orchestrator::handle_turn`].

pub mod error;
pub mod orchestrator;
pub mod response;
pub mod router;
pub mod voice;

#[cfg(test)]
mod scenarios;

pub use error::PipelineError;
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use response::{ClarificationGenerator, PendingClarification, ResponseAggregator};
pub use router::{ParserContext, ParserRouter};
pub use voice::VoiceGenerator;
