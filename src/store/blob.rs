use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Media attachments go through upload-then-URL: the returned URL is what
/// ends up as the content of a media message.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Bytes) -> AppResult<String>;
}

/// In-memory blob store; returned URLs use the `mem://` scheme.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Bytes> {
        self.blobs.read().await.get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> AppResult<String> {
        if path.is_empty() {
            return Err(AppError::Validation("attachment path cannot be empty".into()));
        }
        self.blobs.write().await.insert(path.to_string(), bytes);
        Ok(format!("mem://{path}"))
    }
}
