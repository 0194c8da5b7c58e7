//! S3-backed object store for canned phrases, the TTS cache, and raw audio
//! uploads (spec §4.9, §6.3).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use drivethru_core::error::Result;
use drivethru_core::traits::ObjectStore;

use crate::error::StoreError;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub async fn from_env(bucket: impl Into<String>, public_base_url: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket, public_base_url)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StoreError::Object(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let result = self.client.get_object().bucket(&self.bucket).key(path).send().await;
        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StoreError::Object(e.to_string()))?
                    .into_bytes()
                    .to_vec();
                Ok(Some(bytes))
            }
            Err(aws_sdk_s3::error::SdkError::ServiceError(e)) if e.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StoreError::Object(e.to_string()).into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(path).send().await {
            Ok(_) => Ok(true),
            Err(aws_sdk_s3::error::SdkError::ServiceError(e)) if e.err().is_not_found() => Ok(false),
            Err(e) => Err(StoreError::Object(e.to_string()).into()),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn url_for_strips_trailing_slash_from_base() {
        let config = aws_config::SdkConfig::builder().build();
        let store = S3ObjectStore::new(Client::new(&config), "bucket", "https://cdn.example.com/");
        assert_eq!(store.url_for("tts-cache/restaurant-1/abc.mp3"), "https://cdn.example.com/tts-cache/restaurant-1/abc.mp3");
    }
}
