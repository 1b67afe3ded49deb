//! Attendee profile aggregation - fan-out/fan-in over the profile store
//!
//! One concurrent lookup per user id; the batch settles once every lookup
//! has completed. A failed lookup never blocks or corrupts the others.
//! Failure handling is an explicit policy: skip (drop silently, the
//! default) or collect (failures returned in the batch for inspection).
//! Result ordering is unspecified; callers compare by set, not sequence.

use crate::domain::types::{Profile, UserId};
use crate::error::ProfileLookupError;
use crate::infra::config::LookupFailurePolicy;
use crate::io::profiles::ProfileClient;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Settled result of a profile fan-out
#[derive(Debug, Default)]
pub struct AttendeeBatch {
    /// Successfully fetched profiles, unordered, no duplicate identities
    pub profiles: Vec<Profile>,
    /// Failed lookups; only populated under the collect policy
    pub failures: Vec<(UserId, ProfileLookupError)>,
}

/// Concurrent user-id -> profile aggregation
pub struct AttendeeAggregator {
    profiles: Arc<dyn ProfileClient>,
    policy: LookupFailurePolicy,
}

impl AttendeeAggregator {
    pub fn new(profiles: Arc<dyn ProfileClient>, policy: LookupFailurePolicy) -> Self {
        Self { profiles, policy }
    }

    /// Fetch the profile for every user id, joining on all lookups
    pub async fn fetch_profiles(&self, user_ids: HashSet<UserId>) -> AttendeeBatch {
        let mut lookups = JoinSet::new();
        for user_id in user_ids {
            let client = Arc::clone(&self.profiles);
            lookups.spawn(async move {
                let result = client.get_by_id(&user_id).await;
                (user_id, result)
            });
        }

        let mut batch = AttendeeBatch::default();
        let mut seen: HashSet<UserId> = HashSet::new();
        while let Some(joined) = lookups.join_next().await {
            let (user_id, result) = match joined {
                Ok(settled) => settled,
                Err(e) => {
                    warn!(error = %e, "profile_lookup_task_failed");
                    continue;
                }
            };
            match result {
                Ok(profile) => {
                    if seen.insert(profile.user_id.clone()) {
                        batch.profiles.push(profile);
                    }
                }
                Err(err) => match self.policy {
                    LookupFailurePolicy::Skip => {
                        debug!(user_id = %user_id, error = %err, "profile_lookup_skipped");
                    }
                    LookupFailurePolicy::Collect => {
                        batch.failures.push((user_id, err));
                    }
                },
            }
        }
        batch
    }
}
