//! In-process request counters (spec §1: external telemetry sinks are out
//! of scope, but having no instrumentation at all is not — SPEC_FULL §2).
//! No exporter; `/metrics` renders the counts it has collected in-memory.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

#[derive(Default)]
pub struct RequestCounters {
    pub process_audio_total: AtomicU64,
    pub process_audio_errors: AtomicU64,
    pub turns_total: AtomicU64,
}

impl RequestCounters {
    pub fn record_turn(&self, succeeded: bool) {
        self.process_audio_total.fetch_add(1, Ordering::Relaxed);
        self.turns_total.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.process_audio_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let counters = &state.metrics;
    Json(serde_json::json!({
        "process_audio_total": counters.process_audio_total.load(Ordering::Relaxed),
        "process_audio_errors": counters.process_audio_errors.load(Ordering::Relaxed),
        "turns_total": counters.turns_total.load(Ordering::Relaxed),
    }))
}
