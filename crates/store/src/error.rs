//! Leaf error type for the persistence crate.
//!
//! The trait boundaries this crate implements (`drivethru_core::traits::{
//! SessionStore, OrderArchive, ObjectStore}`) all return
//! `drivethru_core::error::Result`, so every backend-specific failure here
//! ultimately folds into a `CoreError` — matching `command_invoker.py`'s
//! catch-and-wrap behavior at the command boundary (spec §7).

use drivethru_core::error::CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("archive error: {0}")]
    Archive(#[from] sqlx::Error),

    #[error("object store error: {0}")]
    Object(String),

    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Serialization(err) => CoreError::Serialization(err),
            StoreError::Redis(_) | StoreError::Archive(_) => CoreError::Database(e.to_string()),
            StoreError::Object(msg) => CoreError::ExternalService(msg),
        }
    }
}

impl From<StoreError> for drivethru_menu::MenuError {
    fn from(e: StoreError) -> Self {
        drivethru_menu::MenuError::Repository(e.to_string())
    }
}
