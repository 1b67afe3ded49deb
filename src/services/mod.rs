//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `store` - Invariant-checked check-in record persistence
//! - `admission` - Permission -> fix -> geofence admission control
//! - `attendees` - Concurrent profile fan-out/fan-in aggregation
//! - `checkin` - Public orchestrator composing the above

pub mod admission;
pub mod attendees;
pub mod checkin;
pub mod store;

// Re-export commonly used types
pub use admission::{Admission, AdmissionController, RejectReason};
pub use attendees::{AttendeeAggregator, AttendeeBatch};
pub use checkin::CheckInService;
pub use store::CheckInStore;
