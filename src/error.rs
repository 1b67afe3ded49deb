//! Typed failure taxonomy for the check-in surface
//!
//! Every service operation returns one of these kinds, never a raw string.
//! Lower-level failures map 1:1 onto the taxonomy without re-wrapping.

use crate::domain::geo;

fn fmt_distance(meters: &f64) -> String {
    geo::format_distance(*meters)
}

/// Opaque persistence/network failure from the underlying document store
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(#[from] pub anyhow::Error);

impl StoreError {
    pub fn msg(msg: impl Into<String>) -> Self {
        StoreError(anyhow::anyhow!(msg.into()))
    }
}

/// Failure of a single profile lookup during aggregation
///
/// `NotFound` never surfaces through the service; it only shows up as an
/// omission from `get_attendees` results (or in the batch failures when
/// the collect policy is configured).
#[derive(Debug, thiserror::Error)]
pub enum ProfileLookupError {
    #[error("profile not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures exposed by the check-in service operations
#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    /// Location permission not granted; caller should re-request permission
    #[error("location permission required")]
    PermissionRequired,

    /// No fix obtained after exhausting retries; caller may retry later
    #[error("current location unavailable")]
    LocationUnavailable,

    /// Valid fix obtained, but outside the admission radius
    #[error("too far from the event ({} away)", fmt_distance(.distance_meters))]
    OutOfRange { distance_meters: f64 },

    /// An active record already exists for this (user, event) pair
    #[error("already checked in")]
    AlreadyCheckedIn,

    /// Checkout attempted with no active record for the pair
    #[error("no active check-in")]
    NoActiveCheckIn,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
