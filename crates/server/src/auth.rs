//! Bearer-token auth middleware, off by default (`drivethru_config::AuthConfig`).
//! Adapted from the teacher's `auth_middleware`: same constant-time key
//! comparison and public-path bypass, wired against this crate's own
//! `AppState` instead of reaching into request extensions for config.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let auth = &state.settings.server.auth;

    if !auth.enabled {
        return next.run(request).await;
    }

    let path = request.uri().path();
    if auth.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return next.run(request).await;
    }

    let Some(expected) = auth.api_key.as_deref() else {
        tracing::error!("auth is enabled but no api_key is configured");
        return (StatusCode::INTERNAL_SERVER_ERROR, "server authentication not configured").into_response();
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => next.run(request).await,
        Some(_) => (StatusCode::UNAUTHORIZED, "invalid api key").into_response(),
        None => (StatusCode::UNAUTHORIZED, "missing authorization header").into_response(),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_rejects_mismatched_length() {
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn constant_time_eq_matches_equal_and_rejects_different() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
    }
}
