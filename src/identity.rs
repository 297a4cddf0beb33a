use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Read-only identity lookup. The chat core never mutates identity state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile>;
}

/// In-memory directory, doubling as the registration surface for the HTTP
/// API and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl IdentityProvider for InMemoryDirectory {
    async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.profiles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(AppError::NotFound("user"))
    }
}
