//! Domain models - core check-in types and geo math
//!
//! This module contains the canonical data types used throughout the system:
//! - `CheckInRecord` - the primary business entity representing attendance
//! - `EventLocation` - the geofence target (coordinates are optional)
//! - `LocationFix` - a perishable one-shot location reading
//! - `Profile` - attendee profile subset returned by aggregation
//! - `geo` - great-circle distance and distance formatting

pub mod geo;
pub mod types;

// Re-export commonly used types at module level
pub use types::{CheckInRecord, Coordinates, EventId, EventLocation, LocationFix, Profile, RecordId, UserId};
