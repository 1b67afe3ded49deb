//! Device location provider contract
//!
//! The provider hands out single on-demand fixes, never continuous
//! tracking. `request_one_shot_fix` is fire-and-forget: the fix becomes
//! available asynchronously and is picked up by a later `current_fix` call
//! (the admission controller's retry path).

use crate::domain::types::LocationFix;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Client contract for the device location provider
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the user has granted location permission
    async fn has_permission(&self) -> bool;

    /// The current fix, if one is available; fixes are perishable
    async fn current_fix(&self) -> Option<LocationFix>;

    /// Request a one-shot fix; fire-and-forget
    async fn request_one_shot_fix(&self);
}

/// In-memory location provider
///
/// A pending fix staged via `stage_fix` becomes the current fix once
/// `request_one_shot_fix` is called, simulating the asynchronous arrival
/// of a requested reading.
pub struct MemoryLocationProvider {
    permission: AtomicBool,
    current: RwLock<Option<LocationFix>>,
    pending: RwLock<Option<LocationFix>>,
    requests: AtomicUsize,
}

impl MemoryLocationProvider {
    pub fn new() -> Self {
        Self {
            permission: AtomicBool::new(false),
            current: RwLock::new(None),
            pending: RwLock::new(None),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn grant_permission(&self) {
        self.permission.store(true, Ordering::SeqCst);
    }

    pub fn revoke_permission(&self) {
        self.permission.store(false, Ordering::SeqCst);
    }

    /// Make a fix immediately available
    pub fn set_fix(&self, fix: LocationFix) {
        *self.current.write() = Some(fix);
    }

    /// Drop the current fix (simulates staleness)
    pub fn clear_fix(&self) {
        *self.current.write() = None;
    }

    /// Stage a fix that arrives after the next one-shot request
    pub fn stage_fix(&self, fix: LocationFix) {
        *self.pending.write() = Some(fix);
    }

    /// Number of one-shot requests issued so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Default for MemoryLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for MemoryLocationProvider {
    async fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    async fn current_fix(&self) -> Option<LocationFix> {
        *self.current.read()
    }

    async fn request_one_shot_fix(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(fix) = self.pending.write().take() {
            *self.current.write() = Some(fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Coordinates;

    #[tokio::test]
    async fn test_permission_toggles() {
        let provider = MemoryLocationProvider::new();
        assert!(!provider.has_permission().await);
        provider.grant_permission();
        assert!(provider.has_permission().await);
        provider.revoke_permission();
        assert!(!provider.has_permission().await);
    }

    #[tokio::test]
    async fn test_staged_fix_arrives_after_request() {
        let provider = MemoryLocationProvider::new();
        provider.stage_fix(LocationFix::now(Coordinates::new(40.0, -74.0)));

        assert!(provider.current_fix().await.is_none());
        provider.request_one_shot_fix().await;
        assert!(provider.current_fix().await.is_some());
        assert_eq!(provider.request_count(), 1);
    }
}
