//! Reconciliation of fresh observations against catalog entries.

use chrono::{NaiveDate, Utc};

use crate::types::{AircraftRecord, ChangeEntry};

/// Source tag written into every change entry produced here.
pub const CHANGE_SOURCE: &str = "airline_api";

/// Properties whose differences are recorded in history. Everything
/// else is overwritten silently on update.
const TRACKED_WIFI: &str = "connectivity.wifi";
const TRACKED_WIFI_PROVIDER: &str = "connectivity.wifi_provider";
const TRACKED_CABIN_CONFIG: &str = "cabin.physical_configuration";
const TRACKED_SUB_FLEET: &str = "operator.sub_fleet_code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
    Seen,
}

/// Result of reconciling one observation.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    /// The record as it should appear in the catalog afterwards.
    pub record: AircraftRecord,
    pub changes: Vec<ChangeEntry>,
}

/// Merge a freshly transformed record into the catalog state.
///
/// With no existing entry the incoming record is taken verbatim
/// (`Created`). Otherwise tracked properties are diffed: differences
/// produce an `Updated` merge that overwrites connectivity, cabin
/// layout, operator and aircraft type wholesale and appends the change
/// entries (skipping any already in history, so re-application is
/// idempotent); an identical observation is `Seen` and only advances
/// `last_seen`/`total_flights`. `first_seen`, `created_at` and prior
/// history are never touched.
pub fn reconcile(
    existing: Option<&AircraftRecord>,
    incoming: AircraftRecord,
    observation_date: NaiveDate,
) -> ReconcileOutcome {
    let Some(existing) = existing else {
        return ReconcileOutcome {
            action: ReconcileAction::Created,
            record: incoming,
            changes: Vec::new(),
        };
    };

    let changes = tracked_changes(existing, &incoming, observation_date);
    let mut record = existing.clone();
    record.tracking.last_seen = record.tracking.last_seen.max(observation_date);
    record.tracking.total_flights += 1;

    if changes.is_empty() {
        return ReconcileOutcome {
            action: ReconcileAction::Seen,
            record,
            changes,
        };
    }

    record.connectivity = incoming.connectivity.clone();
    record.cabin.physical_configuration = incoming.cabin.physical_configuration.clone();
    record.cabin.total_seats = incoming.cabin.total_seats;
    record.cabin.classes = incoming.cabin.classes.clone();
    record.operator = incoming.operator.clone();
    record.aircraft_type = incoming.aircraft_type.clone();
    record.metadata.updated_at = Utc::now();

    for change in &changes {
        if !record.history.iter().any(|prior| prior.same_change(change)) {
            record.history.push(change.clone());
        }
    }

    ReconcileOutcome {
        action: ReconcileAction::Updated,
        record,
        changes,
    }
}

/// Diff the tracked properties, one change entry per difference.
fn tracked_changes(
    existing: &AircraftRecord,
    incoming: &AircraftRecord,
    observation_date: NaiveDate,
) -> Vec<ChangeEntry> {
    let pairs: [(&str, Option<String>, Option<String>); 4] = [
        (
            TRACKED_WIFI,
            Some(existing.connectivity.wifi.to_string()),
            Some(incoming.connectivity.wifi.to_string()),
        ),
        (
            TRACKED_WIFI_PROVIDER,
            existing.connectivity.wifi_provider.clone(),
            incoming.connectivity.wifi_provider.clone(),
        ),
        (
            TRACKED_CABIN_CONFIG,
            existing.cabin.physical_configuration.clone(),
            incoming.cabin.physical_configuration.clone(),
        ),
        (
            TRACKED_SUB_FLEET,
            existing.operator.sub_fleet_code.clone(),
            incoming.operator.sub_fleet_code.clone(),
        ),
    ];

    pairs
        .into_iter()
        .filter(|(_, old, new)| old != new)
        .map(|(property, old_value, new_value)| ChangeEntry {
            timestamp: observation_date,
            property: property.to_string(),
            old_value,
            new_value,
            source: CHANGE_SOURCE.to_string(),
        })
        .collect()
}
