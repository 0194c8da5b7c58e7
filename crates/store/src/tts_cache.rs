//! TTS cache: a content-addressed key over `(text, voice, language,
//! restaurant_id)` plus a two-layer lookup (spec §4.9).
//!
//! Layer 1 is a small, fast pointer kept in the session store's Redis
//! instance (`voice:cache:restaurant:{id}:{hash}` → object URL, TTL ~24h).
//! Layer 2 is the object itself at `tts-cache/restaurant-{id}/{hash}.mp3`.
//! A layer-1 miss falls through to a layer-2 existence check before the
//! caller synthesizes from scratch, so a cold Redis (but warm S3) never
//! re-synthesizes audio that is already sitting in the bucket.

use std::sync::Arc;

use md5::{Digest, Md5};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use drivethru_core::error::Result;
use drivethru_core::traits::ObjectStore;

use crate::error::StoreError;

const FAST_CACHE_TTL_SECONDS: u64 = 24 * 60 * 60;

pub struct TtsCache {
    redis: ConnectionManager,
    objects: Arc<dyn ObjectStore>,
}

impl TtsCache {
    pub fn new(redis: ConnectionManager, objects: Arc<dyn ObjectStore>) -> Self {
        Self { redis, objects }
    }

    /// `MD5(text ‖ voice ‖ language ‖ restaurant_id)` in hex (spec §4.9).
    pub fn cache_key(text: &str, voice: &str, language: &str, restaurant_id: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(text.as_bytes());
        hasher.update(voice.as_bytes());
        hasher.update(language.as_bytes());
        hasher.update(restaurant_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn object_path(restaurant_id: &str, hash: &str) -> String {
        format!("tts-cache/restaurant-{restaurant_id}/{hash}.mp3")
    }

    fn redis_key(restaurant_id: &str, hash: &str) -> String {
        format!("voice:cache:restaurant:{restaurant_id}:{hash}")
    }

    /// Returns the object URL on either a fast-cache hit or a layer-2
    /// existence check, `None` if neither layer has the object.
    pub async fn lookup(&self, text: &str, voice: &str, language: &str, restaurant_id: &str) -> Result<Option<String>> {
        let hash = Self::cache_key(text, voice, language, restaurant_id);
        let redis_key = Self::redis_key(restaurant_id, &hash);

        let mut conn = self.redis.clone();
        let cached: Option<String> = conn.get(&redis_key).await.map_err(StoreError::Redis)?;
        if let Some(url) = cached {
            return Ok(Some(url));
        }

        let path = Self::object_path(restaurant_id, &hash);
        if self.objects.exists(&path).await? {
            let url = self.objects.url_for(&path);
            conn.set_ex::<_, _, ()>(&redis_key, &url, FAST_CACHE_TTL_SECONDS)
                .await
                .map_err(StoreError::Redis)?;
            return Ok(Some(url));
        }

        Ok(None)
    }

    /// Stores freshly synthesized audio under the derived path and indexes
    /// the fast cache, returning the object URL (spec §4.9 step 3).
    pub async fn store(&self, text: &str, voice: &str, language: &str, restaurant_id: &str, audio: Vec<u8>) -> Result<String> {
        let hash = Self::cache_key(text, voice, language, restaurant_id);
        let path = Self::object_path(restaurant_id, &hash);
        self.objects.put(&path, audio, "audio/mpeg").await?;

        let url = self.objects.url_for(&path);
        let redis_key = Self::redis_key(restaurant_id, &hash);
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(&redis_key, &url, FAST_CACHE_TTL_SECONDS)
            .await
            .map_err(StoreError::Redis)?;

        Ok(url)
    }
}
