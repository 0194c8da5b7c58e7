//! Read-through menu cache and the tool bindings the ADD_ITEM resolver's
//! menu-lookup agent calls against it.

pub mod cache;
pub mod error;
pub mod repository;
pub mod tools;

pub use cache::MenuCache;
pub use error::{MenuError, Result};
pub use repository::MenuRepository;
