//! Check-in gate demo binary
//!
//! Wires the service to the in-memory collaborators and walks one
//! location-gated check-in flow end to end. Useful for eyeballing the
//! structured log output and for smoke-testing a config file.
//!
//! Module structure:
//! - `domain/` - Core types (CheckInRecord, EventLocation, geo math)
//! - `io/` - External collaborator contracts (documents, profiles, location)
//! - `services/` - Business logic (store, admission, attendees, service)
//! - `infra/` - Infrastructure (Config)

use checkin_gate::domain::types::{Coordinates, EventLocation, LocationFix, UserId};
use checkin_gate::infra::Config;
use checkin_gate::io::{MemoryDocumentClient, MemoryLocationProvider, MemoryProfileClient};
use checkin_gate::services::{AdmissionController, AttendeeAggregator, CheckInService, CheckInStore};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Check-in gate - location-gated event attendance demo
#[derive(Parser, Debug)]
#[command(name = "checkin-gate", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("checkin-gate starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        radius_meters = %config.radius_meters(),
        max_retries = %config.max_retries(),
        retry_delay_ms = %config.retry_delay_ms(),
        collection = %config.collection(),
        "config_loaded"
    );

    // In-memory collaborators standing in for the app's real clients
    let documents = Arc::new(MemoryDocumentClient::new());
    let location = Arc::new(MemoryLocationProvider::new());
    let profiles = Arc::new(MemoryProfileClient::new());

    profiles.insert_named("demo-user", "Demo User");
    profiles.insert_named("other-user", "Other User");

    let service = CheckInService::new(
        CheckInStore::new(documents.clone(), config.collection()),
        AdmissionController::new(location.clone(), &config),
        AttendeeAggregator::new(profiles.clone(), config.lookup_failure()),
        &config,
    );

    // A venue in lower Manhattan; the demo user is a block away
    let event = EventLocation::at("demo-event", Coordinates::new(40.7128, -74.0060));
    let user = UserId::from("demo-user");

    location.grant_permission();
    location.set_fix(LocationFix::now(Coordinates::new(40.7140, -74.0048)));

    service.check_in_with_location_validation(&user, &event).await?;
    service.check_in(&UserId::from("other-user"), &event.event_id).await?;

    let count = service.get_check_in_count(&event.event_id).await?;
    let attendees = service.get_attendees(&event.event_id).await?;
    info!(
        event_id = %event.event_id,
        count = %count,
        attendees = ?attendees.iter().map(|p| p.display_name.as_str()).collect::<Vec<_>>(),
        "event_attendance"
    );

    service.check_out(&user, &event.event_id).await?;
    let checked_in = service.is_checked_in(&user, &event.event_id).await?;
    info!(user_id = %user, checked_in = %checked_in, "after_checkout");

    Ok(())
}
