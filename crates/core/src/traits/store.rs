//! Session/order store and object store trait boundaries (spec §4.9, §4.10).

use async_trait::async_trait;

use crate::error::Result;
use crate::session::Session;

/// Primary key-value session/order store (spec §4.10). Keys:
/// `current:session` (the single active session id) and `session:{id}` (the
/// session blob). TTLs are refreshed on every touch.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn get_current_session_id(&self) -> Result<Option<String>>;

    async fn set_current_session_id(&self, session_id: &str) -> Result<()>;

    async fn clear_current_session(&self) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// Write the session blob and refresh its TTL.
    async fn put_session(&self, session: &Session) -> Result<()>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Whether this implementation is backed by a real distributed store
    /// (vs. an in-process fallback used when the store is unavailable —
    /// spec §4.10: "the system degrades to a stateless single-turn mode").
    fn is_distributed(&self) -> bool {
        true
    }
}

/// Write-once relational archive for completed orders (spec §4.10). No
/// session state is archived — only the order header, line items, totals,
/// and final status, once a session reaches `COMPLETED`.
#[async_trait]
pub trait OrderArchive: Send + Sync + 'static {
    /// Archive a completed session's order. Returns the archive's own
    /// integer primary key (spec §9, Open Question 2: `session_id` is never
    /// reused as the archive's PK).
    async fn archive_completed_order(&self, session: &Session) -> Result<i64>;
}

/// Content-addressed object storage backing the TTS cache and canned-phrase
/// catalog (spec §4.9, §6.3).
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>>;

    async fn exists(&self, path: &str) -> Result<bool>;

    /// Public URL for a stored object, regardless of whether it currently
    /// exists (used to build `audio_url` before the write completes, since
    /// PUTs on an object store are idempotent by content — spec §5.6).
    fn url_for(&self, path: &str) -> String;
}
