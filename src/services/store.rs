//! Check-in record persistence over the document store client
//!
//! Upholds the one-active-record-per-(user, event) invariant: `create`
//! runs its existence check and insert under a per-pair async lock, so two
//! concurrent creates in the same process cannot both pass the check. Two
//! clients talking to the same backing store through separate processes
//! can still race; the document store contract offers no conditional
//! write, and that residual race is a documented property of the backend.

use crate::domain::types::{CheckInRecord, EventId, RecordId, UserId};
use crate::error::{CheckInError, StoreError};
use crate::io::document::{DocumentClient, Predicate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Wire shape of a check-in document; the id lives outside the fields
#[derive(Debug, Serialize, Deserialize)]
struct CheckInDoc {
    user_id: UserId,
    event_id: EventId,
    is_active: bool,
    checked_in_at: DateTime<Utc>,
    checked_out_at: Option<DateTime<Utc>>,
}

impl CheckInDoc {
    fn new_active(user_id: &UserId, event_id: &EventId, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.clone(),
            event_id: event_id.clone(),
            is_active: true,
            checked_in_at: now,
            checked_out_at: None,
        }
    }

    fn into_record(self, id: RecordId) -> CheckInRecord {
        CheckInRecord {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            is_active: self.is_active,
            checked_in_at: self.checked_in_at,
            checked_out_at: self.checked_out_at,
        }
    }
}

/// Persistence and query operations over check-in records
pub struct CheckInStore {
    client: Arc<dyn DocumentClient>,
    collection: String,
    /// Per-(user, event) locks serializing the read-then-write paths
    /// (create and deactivate). Entries are pruned once idle.
    pair_locks: Mutex<HashMap<(UserId, EventId), Arc<Mutex<()>>>>,
}

impl CheckInStore {
    pub fn new(client: Arc<dyn DocumentClient>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
            pair_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn pair_lock(&self, user_id: &UserId, event_id: &EventId) -> Arc<Mutex<()>> {
        let mut locks = self.pair_locks.lock().await;
        locks
            .entry((user_id.clone(), event_id.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the map entry for the pair once the map and the caller hold
    /// the only references, so the map does not grow with every pair seen
    async fn prune_pair_lock(&self, user_id: &UserId, event_id: &EventId, lock: &Arc<Mutex<()>>) {
        let mut locks = self.pair_locks.lock().await;
        let key = (user_id.clone(), event_id.clone());
        if let Some(entry) = locks.get(&key) {
            if Arc::ptr_eq(entry, lock) && Arc::strong_count(entry) == 2 {
                locks.remove(&key);
            }
        }
    }

    fn codec_err(e: serde_json::Error) -> CheckInError {
        CheckInError::Store(StoreError::from(anyhow::Error::new(e)))
    }

    /// Create a new active record for the pair
    ///
    /// Fails with `AlreadyCheckedIn` if an active record already exists.
    pub async fn create(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<CheckInRecord, CheckInError> {
        let lock = self.pair_lock(user_id, event_id).await;
        let guard = lock.lock().await;
        let result = self.create_locked(user_id, event_id).await;
        drop(guard);
        self.prune_pair_lock(user_id, event_id, &lock).await;
        result
    }

    async fn create_locked(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<CheckInRecord, CheckInError> {
        if self.find_active(user_id, event_id).await?.is_some() {
            debug!(user_id = %user_id, event_id = %event_id, "checkin_duplicate_rejected");
            return Err(CheckInError::AlreadyCheckedIn);
        }

        let doc = CheckInDoc::new_active(user_id, event_id, Utc::now());
        let fields = serde_json::to_value(&doc).map_err(Self::codec_err)?;
        let id = self
            .client
            .insert(&self.collection, fields)
            .await
            .map_err(CheckInError::Store)?;

        info!(
            user_id = %user_id,
            event_id = %event_id,
            record_id = %id,
            "checkin_created"
        );

        Ok(doc.into_record(id))
    }

    /// The current active record for the pair, if any
    pub async fn find_active(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<Option<CheckInRecord>, CheckInError> {
        let predicate = Predicate::new()
            .user_id(user_id)
            .event_id(event_id)
            .is_active(true);
        let docs = self
            .client
            .query(&self.collection, &predicate)
            .await
            .map_err(CheckInError::Store)?;

        let Some(doc) = docs.into_iter().next() else {
            return Ok(None);
        };
        let fields: CheckInDoc = serde_json::from_value(doc.fields).map_err(Self::codec_err)?;
        Ok(Some(fields.into_record(doc.id)))
    }

    /// Transition a record to inactive, setting checked_out_at
    ///
    /// Fails with `NoActiveCheckIn` if the record is already inactive
    /// (idempotency guard against double-checkout). The guard re-reads
    /// store state under the pair lock, not just the caller's snapshot,
    /// so checked_out_at is written exactly once even when two checkouts
    /// race with the same stale record.
    pub async fn deactivate(&self, record: &CheckInRecord) -> Result<(), CheckInError> {
        if !record.is_active {
            return Err(CheckInError::NoActiveCheckIn);
        }

        let lock = self.pair_lock(&record.user_id, &record.event_id).await;
        let guard = lock.lock().await;
        let result = self.deactivate_locked(record).await;
        drop(guard);
        self.prune_pair_lock(&record.user_id, &record.event_id, &lock).await;
        result
    }

    async fn deactivate_locked(&self, record: &CheckInRecord) -> Result<(), CheckInError> {
        let current = self.find_active(&record.user_id, &record.event_id).await?;
        if current.map(|active| active.id) != Some(record.id) {
            return Err(CheckInError::NoActiveCheckIn);
        }

        let checked_out_at = Utc::now();
        let fields = serde_json::json!({
            "is_active": false,
            "checked_out_at": checked_out_at,
        });
        self.client
            .update(&self.collection, record.id, fields)
            .await
            .map_err(CheckInError::Store)?;

        info!(
            user_id = %record.user_id,
            event_id = %record.event_id,
            record_id = %record.id,
            "checkin_deactivated"
        );

        Ok(())
    }

    /// Count of active records for the event; 0 when there are none
    pub async fn count_active(&self, event_id: &EventId) -> Result<usize, CheckInError> {
        let predicate = Predicate::new().event_id(event_id).is_active(true);
        let docs = self
            .client
            .query(&self.collection, &predicate)
            .await
            .map_err(CheckInError::Store)?;
        Ok(docs.len())
    }

    /// Distinct user ids with an active record for the event
    pub async fn list_active_user_ids(
        &self,
        event_id: &EventId,
    ) -> Result<HashSet<UserId>, CheckInError> {
        let predicate = Predicate::new().event_id(event_id).is_active(true);
        let docs = self
            .client
            .query(&self.collection, &predicate)
            .await
            .map_err(CheckInError::Store)?;

        let mut user_ids = HashSet::new();
        for doc in docs {
            let fields: CheckInDoc = serde_json::from_value(doc.fields).map_err(Self::codec_err)?;
            user_ids.insert(fields.user_id);
        }
        Ok(user_ids)
    }
}
