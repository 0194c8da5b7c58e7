//! HTTP surface for the drive-thru conversation core (spec §6.1).

pub mod auth;
pub mod error;
pub mod http;
pub mod metrics;
pub mod state;
pub mod vendor;

pub use auth::auth_middleware;
pub use error::ServerError;
pub use http::create_router;
pub use metrics::{metrics_handler, RequestCounters};
pub use state::AppState;
