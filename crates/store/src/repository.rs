//! Session lifecycle operations spanning both the primary store and the
//! archive (spec §4.10 "Operations"): `handle_new_car`, `handle_next_car`,
//! `get_current_session`, `update_session`. This is the one place in the
//! crate that knows about the `current:session` single-writer discipline
//! and the COMPLETED → archive-then-delete transition.

use std::sync::Arc;

use drivethru_core::error::{CoreError, Result};
use drivethru_core::session::{Session, SessionStatus};
use drivethru_core::traits::{OrderArchive, SessionStore};

use crate::error::StoreError;

pub struct SessionRepository {
    store: Arc<dyn SessionStore>,
    archive: Arc<dyn OrderArchive>,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn SessionStore>, archive: Arc<dyn OrderArchive>) -> Self {
        Self { store, archive }
    }

    /// If a session is current, mark it cancelled and discard it (spec §9,
    /// Open Question 3: `CANCELLED` sessions are never archived). Mint a
    /// fresh `session_id` and make it current.
    pub async fn handle_new_car(&self, restaurant_id: &str) -> Result<Session> {
        if let Some(old_id) = self.store.get_current_session_id().await? {
            self.store.delete_session(&old_id).await?;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone(), restaurant_id);
        self.store.put_session(&session).await?;
        self.store.set_current_session_id(&session_id).await?;
        Ok(session)
    }

    /// Cancel-and-clear any current session without minting a new one
    /// (spec §4.10: "cancel-and-clear any current session").
    pub async fn handle_next_car(&self) -> Result<()> {
        if let Some(old_id) = self.store.get_current_session_id().await? {
            self.store.delete_session(&old_id).await?;
        }
        self.store.clear_current_session().await
    }

    pub async fn get_current_session(&self) -> Result<Option<Session>> {
        match self.store.get_current_session_id().await? {
            Some(id) => self.store.get_session(&id).await,
            None => Ok(None),
        }
    }

    /// Shallow-merges `patch` onto the session named `session_id`, refreshing
    /// `updated_at`. Fails unless `session_id` is the current session (spec
    /// §4.10). A transition to `COMPLETED` archives the order, then deletes
    /// both the session blob and the `current:session` pointer.
    pub async fn update_session(&self, session_id: &str, patch: serde_json::Value) -> Result<Session> {
        let current_id = self.store.get_current_session_id().await?;
        if current_id.as_deref() != Some(session_id) {
            return Err(CoreError::NotCurrentSession(session_id.to_string()));
        }

        let Some(session) = self.store.get_session(session_id).await? else {
            return Err(CoreError::SessionNotFound(session_id.to_string()));
        };

        let mut value = serde_json::to_value(&session).map_err(StoreError::Serialization)?;
        if let (Some(target), Some(patch_fields)) = (value.as_object_mut(), patch.as_object()) {
            for (key, v) in patch_fields {
                target.insert(key.clone(), v.clone());
            }
        }
        let mut session: Session = serde_json::from_value(value).map_err(StoreError::Serialization)?;
        session.updated_at = chrono::Utc::now();

        if session.status == SessionStatus::Completed {
            self.archive.archive_completed_order(&session).await?;
            self.store.delete_session(session_id).await?;
            self.store.clear_current_session().await?;
            return Ok(session);
        }

        self.store.put_session(&session).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_store::InMemorySessionStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct CountingArchive {
        archived: AtomicI64,
    }

    #[async_trait]
    impl OrderArchive for CountingArchive {
        async fn archive_completed_order(&self, _session: &Session) -> Result<i64> {
            Ok(self.archived.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    fn repo() -> (SessionRepository, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let archive = Arc::new(CountingArchive { archived: AtomicI64::new(0) });
        (SessionRepository::new(store.clone(), archive), store)
    }

    #[tokio::test]
    async fn new_car_replaces_any_current_session() {
        let (repo, store) = repo();
        let first = repo.handle_new_car("r1").await.unwrap();
        let second = repo.handle_new_car("r1").await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert!(store.get_session(&first.session_id).await.unwrap().is_none());
        assert_eq!(repo.get_current_session().await.unwrap().unwrap().session_id, second.session_id);
    }

    #[tokio::test]
    async fn update_session_rejects_non_current_id() {
        let (repo, _store) = repo();
        repo.handle_new_car("r1").await.unwrap();
        let err = repo.update_session("not-current", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, CoreError::NotCurrentSession(_)));
    }

    #[tokio::test]
    async fn completed_patch_archives_and_clears_both_keys() {
        let (repo, store) = repo();
        let session = repo.handle_new_car("r1").await.unwrap();

        let updated = repo
            .update_session(&session.session_id, serde_json::json!({ "status": "COMPLETED" }))
            .await
            .unwrap();
        assert_eq!(updated.status, SessionStatus::Completed);
        assert!(repo.get_current_session().await.unwrap().is_none());
        assert!(store.get_session(&session.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn next_car_clears_without_minting() {
        let (repo, _store) = repo();
        let session = repo.handle_new_car("r1").await.unwrap();
        repo.handle_next_car().await.unwrap();
        assert!(repo.get_current_session().await.unwrap().is_none());
        let _ = session;
    }
}
