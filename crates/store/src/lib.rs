//! Session/order persistence and the TTS/canned-phrase object store (spec
//! §4.9, §4.10).
//!
//! This crate implements the trait boundaries `drivethru_core::traits`
//! defines (`SessionStore`, `OrderArchive`, `ObjectStore`) against Redis, a
//! Postgres archive, and S3, and adds the cross-cutting logic the traits
//! alone don't express: the `current:session` single-writer lifecycle
//! (`SessionRepository`) and the TTS cache's two-layer lookup (`TtsCache`).

pub mod archive;
pub mod error;
pub mod menu_repository;
pub mod object_store;
pub mod repository;
pub mod session_store;
pub mod tts_cache;

pub use archive::SqlxOrderArchive;
pub use error::StoreError;
pub use menu_repository::SqlxMenuRepository;
pub use object_store::S3ObjectStore;
pub use repository::SessionRepository;
pub use session_store::{InMemorySessionStore, RedisSessionStore};
pub use tts_cache::TtsCache;
