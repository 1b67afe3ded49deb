//! External collaborator contracts
//!
//! This subsystem is a library-level component; its external surface is the
//! set of clients it is constructed with:
//! - `document` - generic queryable document store (check-in persistence)
//! - `profiles` - profile store lookups (attendee aggregation)
//! - `location` - device location provider (permission + one-shot fixes)
//!
//! Each contract ships with an in-memory implementation used by the demo
//! binary and by tests.

pub mod document;
pub mod location;
pub mod profiles;

// Re-export commonly used types
pub use document::{Document, DocumentClient, MemoryDocumentClient, Predicate};
pub use location::{LocationProvider, MemoryLocationProvider};
pub use profiles::{MemoryProfileClient, ProfileClient};
