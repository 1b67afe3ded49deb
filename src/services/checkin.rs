//! Public check-in orchestrator
//!
//! Composes the store, the admission controller, and the attendee
//! aggregator behind the six operations consumed by the app. Failures map
//! 1:1 onto the `CheckInError` taxonomy; nothing is re-wrapped. The single
//! deliberate exception is `is_checked_in` under the compat flag, which
//! degrades store errors to `false` instead of propagating them (a legacy
//! quirk, off by default).

use crate::domain::types::{EventId, EventLocation, Profile, UserId};
use crate::error::CheckInError;
use crate::infra::config::Config;
use crate::services::admission::{Admission, AdmissionController};
use crate::services::attendees::AttendeeAggregator;
use crate::services::store::CheckInStore;
use tracing::{debug, warn};

/// Orchestrates check-in, check-out, and attendance queries
pub struct CheckInService {
    store: CheckInStore,
    admission: AdmissionController,
    aggregator: AttendeeAggregator,
    degrade_is_checked_in: bool,
}

impl CheckInService {
    pub fn new(
        store: CheckInStore,
        admission: AdmissionController,
        aggregator: AttendeeAggregator,
        config: &Config,
    ) -> Self {
        Self {
            store,
            admission,
            aggregator,
            degrade_is_checked_in: config.degrade_is_checked_in(),
        }
    }

    /// Register attendance without any location gating
    pub async fn check_in(&self, user_id: &UserId, event_id: &EventId) -> Result<(), CheckInError> {
        self.store.create(user_id, event_id).await?;
        Ok(())
    }

    /// Register attendance only if the admission controller admits the
    /// attempt; a rejection never touches the store
    pub async fn check_in_with_location_validation(
        &self,
        user_id: &UserId,
        event: &EventLocation,
    ) -> Result<(), CheckInError> {
        match self.admission.validate(user_id, event).await {
            Admission::Admitted => self.check_in(user_id, &event.event_id).await,
            Admission::Rejected(reason) => Err(reason.into()),
        }
    }

    /// End the user's active attendance at the event
    pub async fn check_out(&self, user_id: &UserId, event_id: &EventId) -> Result<(), CheckInError> {
        let Some(record) = self.store.find_active(user_id, event_id).await? else {
            return Err(CheckInError::NoActiveCheckIn);
        };
        self.store.deactivate(&record).await
    }

    /// Whether the user has an active attendance at the event
    ///
    /// Strict by default: store errors propagate. With the compat flag set
    /// they degrade to `false` (best-effort read, matching the legacy
    /// behavior).
    pub async fn is_checked_in(
        &self,
        user_id: &UserId,
        event_id: &EventId,
    ) -> Result<bool, CheckInError> {
        match self.store.find_active(user_id, event_id).await {
            Ok(record) => Ok(record.is_some()),
            Err(err) if self.degrade_is_checked_in => {
                warn!(
                    user_id = %user_id,
                    event_id = %event_id,
                    error = %err,
                    "is_checked_in_degraded_to_false"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Number of users currently checked in at the event
    pub async fn get_check_in_count(&self, event_id: &EventId) -> Result<usize, CheckInError> {
        self.store.count_active(event_id).await
    }

    /// Profiles of the users currently checked in at the event
    ///
    /// Profiles that fail to resolve are omitted, never surfaced as an
    /// error (see the aggregator's failure policy).
    pub async fn get_attendees(&self, event_id: &EventId) -> Result<Vec<Profile>, CheckInError> {
        let user_ids = self.store.list_active_user_ids(event_id).await?;
        let requested = user_ids.len();
        let batch = self.aggregator.fetch_profiles(user_ids).await;
        if batch.profiles.len() < requested {
            debug!(
                event_id = %event_id,
                requested = %requested,
                resolved = %batch.profiles.len(),
                "attendee_profiles_partial"
            );
        }
        Ok(batch.profiles)
    }
}
