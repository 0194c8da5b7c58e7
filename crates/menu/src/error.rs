use thiserror::Error;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("menu repository error: {0}")]
    Repository(String),

    #[error("unknown menu tool: {0}")]
    UnknownTool(String),

    #[error("menu item not found: {0}")]
    ItemNotFound(String),
}

pub type Result<T> = std::result::Result<T, MenuError>;
