//! Admission control: permission -> fix -> geofence
//!
//! Decides whether a check-in attempt may proceed. The controller performs
//! no writes; its only side effect is requesting a one-shot fix when none
//! is available. A missing fix schedules a bounded retry of the whole
//! validation (permission is re-checked each pass); the retry delay is a
//! plain awaited sleep, so a caller that drops the future cancels the
//! pending retry with it.
//!
//! Decision order:
//! 1. No permission -> Rejected(PermissionRequired)
//! 2. Event has no coordinates -> Admitted (nothing to geofence; an
//!    unlocated event degrades to unconditional admission by policy, and
//!    no fix is acquired for it)
//! 3. No fix -> request one, retry after the delay, at most max_retries
//!    times; exhaustion -> Rejected(LocationUnavailable)
//! 4. distance(fix, event) <= radius -> Admitted, else Rejected(OutOfRange)

use crate::domain::geo;
use crate::domain::types::{Coordinates, EventLocation, LocationFix, UserId};
use crate::error::CheckInError;
use crate::infra::config::Config;
use crate::io::location::LocationProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Terminal outcome of a validation
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admitted,
    Rejected(RejectReason),
}

/// Why a validation was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    PermissionRequired,
    LocationUnavailable,
    OutOfRange { distance_meters: f64 },
}

impl From<RejectReason> for CheckInError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::PermissionRequired => CheckInError::PermissionRequired,
            RejectReason::LocationUnavailable => CheckInError::LocationUnavailable,
            RejectReason::OutOfRange { distance_meters } => {
                CheckInError::OutOfRange { distance_meters }
            }
        }
    }
}

/// One pass over the injected state
enum Pass {
    Decided(Admission),
    NeedsFix,
}

/// The location gate state machine
pub struct AdmissionController {
    location: Arc<dyn LocationProvider>,
    radius_meters: f64,
    max_retries: u32,
    retry_delay: Duration,
}

impl AdmissionController {
    pub fn new(location: Arc<dyn LocationProvider>, config: &Config) -> Self {
        Self {
            location,
            radius_meters: config.radius_meters(),
            max_retries: config.max_retries(),
            retry_delay: Duration::from_millis(config.retry_delay_ms()),
        }
    }

    /// Validate a check-in attempt for the event
    pub async fn validate(&self, user_id: &UserId, event: &EventLocation) -> Admission {
        let mut attempt: u32 = 0;
        loop {
            match self.evaluate(event).await {
                Pass::Decided(admission) => {
                    self.log_decision(user_id, event, &admission);
                    return admission;
                }
                Pass::NeedsFix => {
                    if attempt >= self.max_retries {
                        let admission = Admission::Rejected(RejectReason::LocationUnavailable);
                        self.log_decision(user_id, event, &admission);
                        return admission;
                    }
                    attempt += 1;
                    self.location.request_one_shot_fix().await;
                    debug!(
                        user_id = %user_id,
                        event_id = %event.event_id,
                        attempt = %attempt,
                        delay_ms = %self.retry_delay.as_millis(),
                        "admission_retry_scheduled"
                    );
                    // Cancellation point: dropping the caller future drops
                    // the pending retry with it
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn evaluate(&self, event: &EventLocation) -> Pass {
        if !self.location.has_permission().await {
            return Pass::Decided(Admission::Rejected(RejectReason::PermissionRequired));
        }

        // Events without a known location cannot be geofenced; they admit
        // unconditionally and no fix is requested for them
        let Some(target) = event.coordinates else {
            return Pass::Decided(Admission::Admitted);
        };

        let Some(fix) = self.location.current_fix().await else {
            return Pass::NeedsFix;
        };

        Pass::Decided(self.check_range(&fix, target))
    }

    fn check_range(&self, fix: &LocationFix, target: Coordinates) -> Admission {
        let distance_meters = geo::distance_meters(fix.coordinates, target);
        if distance_meters <= self.radius_meters {
            Admission::Admitted
        } else {
            Admission::Rejected(RejectReason::OutOfRange { distance_meters })
        }
    }

    fn log_decision(&self, user_id: &UserId, event: &EventLocation, admission: &Admission) {
        match admission {
            Admission::Admitted => info!(
                user_id = %user_id,
                event_id = %event.event_id,
                "admission_admitted"
            ),
            Admission::Rejected(reason) => info!(
                user_id = %user_id,
                event_id = %event.event_id,
                reason = ?reason,
                "admission_rejected"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Coordinates;
    use crate::io::location::MemoryLocationProvider;

    const EVENT_COORDS: Coordinates = Coordinates { latitude: 40.7128, longitude: -74.0060 };

    fn controller(provider: Arc<MemoryLocationProvider>, config: Config) -> AdmissionController {
        AdmissionController::new(provider, &config)
    }

    fn fast_config() -> Config {
        Config::default().with_retry_delay_ms(5)
    }

    #[tokio::test]
    async fn test_rejects_without_permission() {
        let provider = Arc::new(MemoryLocationProvider::new());
        let gate = controller(provider, fast_config());

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert_eq!(result, Admission::Rejected(RejectReason::PermissionRequired));
    }

    #[tokio::test]
    async fn test_no_coordinates_admits_without_fix() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        let gate = controller(provider.clone(), fast_config());

        let event = EventLocation::new("e1");
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert_eq!(result, Admission::Admitted);
        // No fix was requested for an unlocated event
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_admits_within_radius() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        // ~556 m north of the event
        provider.set_fix(LocationFix::now(Coordinates::new(40.7178, -74.0060)));
        let gate = controller(provider, fast_config());

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert_eq!(result, Admission::Admitted);
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_with_distance() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        // ~2224 m north of the event
        let fix_coords = Coordinates::new(40.7328, -74.0060);
        provider.set_fix(LocationFix::now(fix_coords));
        let gate = controller(provider, fast_config());

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = gate.validate(&UserId::from("u1"), &event).await;

        let expected = geo::distance_meters(fix_coords, EVENT_COORDS);
        match result {
            Admission::Rejected(RejectReason::OutOfRange { distance_meters }) => {
                assert!((distance_meters - expected).abs() < 1e-9);
                assert!(distance_meters > 1_609.344);
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_boundary_distance_equal_to_radius_admits() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        let fix_coords = Coordinates::new(40.7328, -74.0060);
        provider.set_fix(LocationFix::now(fix_coords));

        // Radius set to the exact measured distance: d <= radius admits
        let d = geo::distance_meters(fix_coords, EVENT_COORDS);
        let gate = controller(provider.clone(), fast_config().with_radius_meters(d));
        let event = EventLocation::at("e1", EVENT_COORDS);
        assert_eq!(gate.validate(&UserId::from("u1"), &event).await, Admission::Admitted);

        // A hair under the distance rejects
        let gate = controller(provider, fast_config().with_radius_meters(d - 0.001));
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert!(matches!(result, Admission::Rejected(RejectReason::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn test_retry_picks_up_requested_fix() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        // No current fix; the staged one arrives via the one-shot request
        provider.stage_fix(LocationFix::now(Coordinates::new(40.7178, -74.0060)));
        let gate = controller(provider.clone(), fast_config());

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert_eq!(result, Admission::Admitted);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted_rejects_unavailable() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        let gate = controller(provider.clone(), fast_config().with_max_retries(2));

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = gate.validate(&UserId::from("u1"), &event).await;
        assert_eq!(result, Admission::Rejected(RejectReason::LocationUnavailable));
        // One request per retry attempt
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_permission_rechecked_after_retry() {
        // Permission revoked while the retry is pending: the re-evaluation
        // must see it
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        let gate = AdmissionController::new(
            provider.clone(),
            &Config::default().with_retry_delay_ms(50),
        );

        let event = EventLocation::at("e1", EVENT_COORDS);
        let validation = {
            let provider = provider.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                provider.revoke_permission();
            });
            gate.validate(&UserId::from("u1"), &event).await
        };

        assert_eq!(validation, Admission::Rejected(RejectReason::PermissionRequired));
    }

    #[tokio::test]
    async fn test_dropping_validation_cancels_pending_retry() {
        let provider = Arc::new(MemoryLocationProvider::new());
        provider.grant_permission();
        let gate = controller(provider.clone(), Config::default().with_retry_delay_ms(10_000));

        let event = EventLocation::at("e1", EVENT_COORDS);
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            gate.validate(&UserId::from("u1"), &event),
        )
        .await;

        // Timed out while the retry was pending; dropping the future is the
        // cancellation
        assert!(result.is_err());
        assert_eq!(provider.request_count(), 1);
    }
}
