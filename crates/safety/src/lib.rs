//! Deterministic, dependency-light front-line filter over raw transcripts
//! (spec §4.1). Runs before intent classification; no LLM call involved.

pub mod gate;
pub mod patterns;

pub use gate::{SafetyGate, SafetyVerdict};
