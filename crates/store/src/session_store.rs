//! `SessionStore` (spec §4.10 "Primary") backed by Redis.
//!
//! Keys: `current:session` (the single active session id) and
//! `session:{id}` (the JSON session blob). Both carry the session TTL and
//! are refreshed on every touch.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use drivethru_core::error::Result;
use drivethru_core::session::{Session, SESSION_TTL_SECONDS};
use drivethru_core::traits::SessionStore;

use crate::error::StoreError;

const CURRENT_SESSION_KEY: &str = "current:session";

fn session_key(session_id: &str) -> String {
    format!("session:{session_id}")
}

pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> crate::error::Result<Self> {
        let client = redis::Client::open(redis_url).map_err(StoreError::Redis)?;
        let conn = client.get_connection_manager().await.map_err(StoreError::Redis)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_current_session_id(&self) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let id: Option<String> = conn.get(CURRENT_SESSION_KEY).await.map_err(StoreError::Redis)?;
        Ok(id)
    }

    async fn set_current_session_id(&self, session_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(CURRENT_SESSION_KEY, session_id, SESSION_TTL_SECONDS as u64)
            .await
            .map_err(StoreError::Redis)?;
        Ok(())
    }

    async fn clear_current_session(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(CURRENT_SESSION_KEY).await.map_err(StoreError::Redis)?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(session_key(session_id)).await.map_err(StoreError::Redis)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json).map_err(StoreError::Serialization)?)),
            None => Ok(None),
        }
    }

    async fn put_session(&self, session: &Session) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(session).map_err(StoreError::Serialization)?;
        conn.set_ex::<_, _, ()>(session_key(&session.session_id), json, SESSION_TTL_SECONDS as u64)
            .await
            .map_err(StoreError::Redis)?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(session_key(session_id)).await.map_err(StoreError::Redis)?;
        Ok(())
    }
}

/// In-process fallback used when Redis is unreachable (spec §4.10
/// "Consistency": "the system degrades to a stateless single-turn mode").
/// Not TTL-aware — it exists to keep a single turn working, not to survive a
/// restart or a second instance.
#[derive(Default)]
pub struct InMemorySessionStore {
    current: parking_lot::RwLock<Option<String>>,
    sessions: parking_lot::RwLock<std::collections::HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_current_session_id(&self) -> Result<Option<String>> {
        Ok(self.current.read().clone())
    }

    async fn set_current_session_id(&self, session_id: &str) -> Result<()> {
        *self.current.write() = Some(session_id.to_string());
        Ok(())
    }

    async fn clear_current_session(&self) -> Result<()> {
        *self.current.write() = None;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn put_session(&self, session: &Session) -> Result<()> {
        self.sessions.write().insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }

    fn is_distributed(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivethru_core::session::Session;

    #[tokio::test]
    async fn in_memory_store_round_trips_current_session() {
        let store = InMemorySessionStore::new();
        assert!(store.get_current_session_id().await.unwrap().is_none());

        let session = Session::new("sess-1", "r-1");
        store.put_session(&session).await.unwrap();
        store.set_current_session_id("sess-1").await.unwrap();

        assert_eq!(store.get_current_session_id().await.unwrap().as_deref(), Some("sess-1"));
        let fetched = store.get_session("sess-1").await.unwrap().unwrap();
        assert_eq!(fetched.restaurant_id, "r-1");

        store.clear_current_session().await.unwrap();
        assert!(store.get_current_session_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn in_memory_store_delete_removes_session() {
        let store = InMemorySessionStore::new();
        store.put_session(&Session::new("sess-1", "r-1")).await.unwrap();
        store.delete_session("sess-1").await.unwrap();
        assert!(store.get_session("sess-1").await.unwrap().is_none());
    }
}
