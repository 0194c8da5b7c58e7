//! Thin HTTP surface (spec §6.1) binding the `drivethru-pipeline`
//! orchestrator and `drivethru-store` session lifecycle to five routes.
//! Route table shape, CORS construction and health/ready checks are
//! grounded on the teacher's `server/src/http.rs`.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use drivethru_core::PhraseType;

use crate::error::ServerError;
use crate::metrics::metrics_handler;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.settings.server.cors_origins, state.settings.server.cors_enabled);

    let mut router = Router::new()
        .route("/sessions/new-car", post(new_car))
        .route("/sessions/next-car", post(next_car))
        .route("/sessions/current", get(current_session))
        .route("/sessions/:id", put(patch_session))
        .route("/ai/process-audio", post(process_audio))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state.clone());

    if state.settings.server.auth.enabled {
        router = router.layer(axum::middleware::from_fn_with_state(state, crate::auth::auth_middleware));
    }

    router.layer(TraceLayer::new_for_http()).layer(cors)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        return CorsLayer::permissive();
    }
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        tracing::warn!("cors enabled but no valid origins configured; falling back to permissive");
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Deserialize)]
struct NewCarRequest {
    restaurant_id: String,
}

#[derive(Serialize)]
struct NewCarResponse {
    session_id: String,
    greeting_audio_url: String,
    session: drivethru_core::session::Session,
}

async fn new_car(State(state): State<AppState>, Json(req): Json<NewCarRequest>) -> Result<Json<NewCarResponse>, ServerError> {
    if req.restaurant_id.trim().is_empty() {
        return Err(ServerError::Validation("restaurant_id is required".to_string()));
    }
    let session = state.sessions.handle_new_car(&req.restaurant_id).await?;
    let greeting_audio_url = state.orchestrator.greeting_audio(&req.restaurant_id).await?;
    Ok(Json(NewCarResponse { session_id: session.session_id.clone(), greeting_audio_url, session }))
}

async fn next_car(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    state.sessions.handle_next_car().await?;
    Ok(Json(serde_json::json!({})))
}

async fn current_session(State(state): State<AppState>) -> Result<Json<drivethru_core::session::Session>, ServerError> {
    match state.sessions.get_current_session().await? {
        Some(session) => Ok(Json(session)),
        None => Err(ServerError::NotFound("no current session".to_string())),
    }
}

async fn patch_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<drivethru_core::session::Session>, ServerError> {
    let session = state.sessions.update_session(&id, patch).await?;
    Ok(Json(session))
}

#[derive(Serialize)]
struct ProcessAudioResponse {
    response_text: String,
    audio_url: String,
    intent_type: String,
    order_state_changed: bool,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `multipart: audio_file, restaurant_id, session_id?, language` (spec
/// §6.1). Persists the raw upload under `restaurants/{id}/audio/{filename}`
/// for audit (spec §6.3) before transcribing, so a failed turn still leaves
/// the recording behind.
async fn process_audio(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<ProcessAudioResponse>, ServerError> {
    let mut audio_file: Option<Vec<u8>> = None;
    let mut restaurant_id: Option<String> = None;
    let mut session_id: Option<String> = None;
    let mut language = state.settings.voice.default_language.clone();

    while let Some(field) = multipart.next_field().await.map_err(|e| ServerError::Validation(e.to_string()))? {
        match field.name().unwrap_or_default() {
            "audio_file" => {
                audio_file = Some(field.bytes().await.map_err(|e| ServerError::Validation(e.to_string()))?.to_vec());
            }
            "restaurant_id" => {
                restaurant_id = Some(field.text().await.map_err(|e| ServerError::Validation(e.to_string()))?);
            }
            "session_id" => {
                session_id = Some(field.text().await.map_err(|e| ServerError::Validation(e.to_string()))?);
            }
            "language" => {
                language = field.text().await.map_err(|e| ServerError::Validation(e.to_string()))?;
            }
            _ => {}
        }
    }

    let audio_file = audio_file.ok_or_else(|| ServerError::Validation("audio_file is required".to_string()))?;
    let restaurant_id = restaurant_id.ok_or_else(|| ServerError::Validation("restaurant_id is required".to_string()))?;

    let session_id = match session_id {
        Some(id) => id,
        None => state
            .sessions
            .get_current_session()
            .await?
            .ok_or_else(|| ServerError::NotFound("no current session and no session_id provided".to_string()))?
            .session_id,
    };

    let upload_path = format!("{}/{restaurant_id}/audio/{}.wav", state.audio_upload_prefix, uuid::Uuid::new_v4());
    state.objects.put(&upload_path, audio_file.clone(), "audio/mpeg").await?;

    let transcript = match state.stt.transcribe(&audio_file, &language).await {
        Ok(text) => text,
        Err(e) => {
            state.metrics.record_turn(false);
            return Ok(Json(ProcessAudioResponse {
                response_text: PhraseType::CantHelpRightNow.fallback_text().to_string(),
                audio_url: String::new(),
                intent_type: "UNKNOWN".to_string(),
                order_state_changed: false,
                success: false,
                error: Some(format!("transcription failed: {e}")),
            }));
        }
    };

    let outcome = state.orchestrator.handle_turn(&session_id, &transcript).await?;
    state.metrics.record_turn(true);

    Ok(Json(ProcessAudioResponse {
        response_text: outcome.response_text,
        audio_url: outcome.audio_url,
        intent_type: intent_wire(outcome.intent),
        order_state_changed: outcome.session.conversation_history.back().map(|t| t.order_state_changed).unwrap_or(false),
        success: true,
        error: None,
    }))
}

/// `IntentType`'s `SCREAMING_SNAKE_CASE` wire form (spec §6.1's
/// `intent_type`), the classified intent rather than the response's
/// `PhraseType`.
fn intent_wire(intent: drivethru_core::IntentType) -> String {
    match serde_json::to_value(intent) {
        Ok(serde_json::Value::String(s)) => s,
        _ => "UNKNOWN".to_string(),
    }
}
