//! Shared types for the check-in subsystem

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Newtype wrapper for user IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Newtype wrapper for event IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EventId(pub String);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

/// Store-assigned identifier for a check-in record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        RecordId(Uuid::now_v7())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A single attendance record
///
/// Invariant: for any fixed (user_id, event_id) pair, at most one record
/// has is_active = true at any observation point. The store upholds this
/// for callers within the same process; see `CheckInStore::create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub is_active: bool,
    pub checked_in_at: DateTime<Utc>,
    /// Set exactly once, when the record transitions to inactive
    pub checked_out_at: Option<DateTime<Utc>>,
}

/// The geofence target: subset of the externally-owned Event entity
///
/// Absent coordinates is a normal state (an event without a known
/// location cannot be geofenced), not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub event_id: EventId,
    pub coordinates: Option<Coordinates>,
}

impl EventLocation {
    pub fn new(event_id: impl Into<EventId>) -> Self {
        Self { event_id: event_id.into(), coordinates: None }
    }

    pub fn at(event_id: impl Into<EventId>, coordinates: Coordinates) -> Self {
        Self { event_id: event_id.into(), coordinates: Some(coordinates) }
    }
}

/// A one-shot location reading from the device provider
///
/// Never persisted by this subsystem; treated as perishable and
/// re-requested when absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub captured_at: DateTime<Utc>,
}

impl LocationFix {
    pub fn now(coordinates: Coordinates) -> Self {
        Self { coordinates, captured_at: Utc::now() }
    }
}

/// Attendee profile subset returned by aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}
