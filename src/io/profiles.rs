//! Profile store client contract
//!
//! Attendee aggregation looks profiles up one id at a time; the aggregator
//! owns the fan-out. `MemoryProfileClient` supports per-user failure
//! injection so partial-failure behavior can be tested deliberately.

use crate::domain::types::{Profile, UserId};
use crate::error::{ProfileLookupError, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Client contract for the external profile store
#[async_trait]
pub trait ProfileClient: Send + Sync {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Profile, ProfileLookupError>;
}

/// In-memory profile store
pub struct MemoryProfileClient {
    profiles: RwLock<HashMap<UserId, Profile>>,
    /// Lookups for these users fail with a store error instead of not-found
    failing: RwLock<HashSet<UserId>>,
}

impl MemoryProfileClient {
    pub fn new() -> Self {
        Self { profiles: RwLock::new(HashMap::new()), failing: RwLock::new(HashSet::new()) }
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles.write().insert(profile.user_id.clone(), profile);
    }

    pub fn insert_named(&self, user_id: impl Into<UserId>, display_name: &str) {
        let user_id = user_id.into();
        self.insert(Profile {
            user_id,
            display_name: display_name.to_string(),
            photo_url: None,
        });
    }

    /// Make lookups for this user fail with a store error
    pub fn fail_for(&self, user_id: impl Into<UserId>) {
        self.failing.write().insert(user_id.into());
    }
}

impl Default for MemoryProfileClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileClient for MemoryProfileClient {
    async fn get_by_id(&self, user_id: &UserId) -> Result<Profile, ProfileLookupError> {
        if self.failing.read().contains(user_id) {
            return Err(ProfileLookupError::Store(StoreError::msg(format!(
                "profile store unavailable for {user_id}"
            ))));
        }
        self.profiles
            .read()
            .get(user_id)
            .cloned()
            .ok_or(ProfileLookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_by_id_found() {
        let client = MemoryProfileClient::new();
        client.insert_named("u1", "Alex");

        let profile = client.get_by_id(&UserId::from("u1")).await.unwrap();
        assert_eq!(profile.display_name, "Alex");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let client = MemoryProfileClient::new();
        let result = client.get_by_id(&UserId::from("missing")).await;
        assert!(matches!(result, Err(ProfileLookupError::NotFound)));
    }

    #[tokio::test]
    async fn test_failure_injection_per_user() {
        let client = MemoryProfileClient::new();
        client.insert_named("u1", "Alex");
        client.fail_for("u1");

        let result = client.get_by_id(&UserId::from("u1")).await;
        assert!(matches!(result, Err(ProfileLookupError::Store(_))));
    }
}
