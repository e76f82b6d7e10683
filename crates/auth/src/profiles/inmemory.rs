//! In-memory profile store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use authgate_core::auth::{Profile, ProfileRepository, Result};
use tokio::sync::RwLock;

/// Profiles kept in a HashMap keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfiles {
    profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub async fn upsert(&self, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfiles {
    async fn get_profile(&self, user_id: &str, _access_token: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}
