//! Error taxonomy.
//!
//! Every user-visible failure carries a `{category, code}` pair (spec §7).
//! `CoreError` is the fallible-service error type used *underneath* the
//! command boundary; `Command::execute` never returns it directly — the
//! executor catches it and converts it into a `SYSTEM` / `INTERNAL_ERROR`
//! `OrderResult` (see `drivethru-commands::executor`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("line item not found: {0}")]
    LineItemNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} is not the current session")]
    NotCurrentSession(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::MenuItemNotFound(_) | CoreError::LineItemNotFound(_) => {
                ErrorCategory::Business
            }
            CoreError::SessionNotFound(_) | CoreError::NotCurrentSession(_) => {
                ErrorCategory::Validation
            }
            CoreError::Database(_)
            | CoreError::ExternalService(_)
            | CoreError::Serialization(_)
            | CoreError::Internal(_) => ErrorCategory::System,
        }
    }
}

/// Top-level error bucket (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Validation,
    Business,
    System,
}

/// Specific error code within a category (spec §7). Kept as one flat enum
/// rather than one per category — callers branch on `category()` when they
/// need the bucket, and on the code itself for phrase-type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // VALIDATION
    InvalidInputFormat,
    MissingRequiredField,
    InvalidQuantity,
    // BUSINESS
    ItemUnavailable,
    ItemNotFound,
    SizeNotAvailable,
    OptionRequiredMissing,
    ModifierRemoveNotPresent,
    ModifierAddNotAllowed,
    ModifierConflict,
    QuantityExceedsLimit,
    InventoryShortage,
    // SYSTEM
    DatabaseError,
    ExternalServiceError,
    InternalError,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        use ErrorCode::*;
        match self {
            InvalidInputFormat | MissingRequiredField | InvalidQuantity => {
                ErrorCategory::Validation
            }
            ItemUnavailable
            | ItemNotFound
            | SizeNotAvailable
            | OptionRequiredMissing
            | ModifierRemoveNotPresent
            | ModifierAddNotAllowed
            | ModifierConflict
            | QuantityExceedsLimit
            | InventoryShortage => ErrorCategory::Business,
            DatabaseError | ExternalServiceError | InternalError => ErrorCategory::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_category_matches_taxonomy() {
        assert_eq!(ErrorCode::QuantityExceedsLimit.category(), ErrorCategory::Business);
        assert_eq!(ErrorCode::InvalidQuantity.category(), ErrorCategory::Validation);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }
}
