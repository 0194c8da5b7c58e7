//! Leaf error type for turn orchestration (spec §5.4, §5.5, §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Soft 409: another turn for this session is already in flight (spec
    /// §5.4 "per-session serialization").
    #[error("session {0} is busy with another in-flight turn")]
    SessionBusy(String),

    /// The end-to-end turn budget elapsed before a response was ready (spec
    /// §5.5).
    #[error("turn exceeded its time budget")]
    TurnTimedOut,

    #[error(transparent)]
    Core(#[from] drivethru_core::CoreError),
}
