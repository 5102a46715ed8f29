//! Persistence of the fleet catalog as a single JSON document.
//!
//! The file is written with 2-space indentation and a stable ordering
//! (struct field order, aircraft sorted by type IATA code then
//! registration) so that successive runs produce version-control
//! friendly diffs. Writes go through a temp file and an atomic rename;
//! a crash mid-run never leaves a partial catalog on disk.

use chrono::Utc;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::types::{AircraftRecord, Catalog};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Catalog file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Load a catalog from disk.
///
/// An absent file yields `Ok(None)` and the caller starts from an
/// empty catalog; a file that exists but does not parse is an error,
/// never silently discarded.
pub fn load(path: &Path) -> Result<Option<Catalog>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    let catalog = serde_json::from_str(&data)?;
    Ok(Some(catalog))
}

/// Persist the catalog, normalizing it first.
///
/// Recomputes `aircraft_count`, sorts the aircraft, refreshes
/// `generated_at` and creates missing parent directories.
pub fn save(path: &Path, catalog: &mut Catalog) -> Result<(), StoreError> {
    catalog.aircraft.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    catalog.aircraft_count = catalog.aircraft.len();
    catalog.generated_at = Utc::now();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut json = serde_json::to_string_pretty(catalog)?;
    json.push('\n');

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), aircraft = catalog.aircraft_count, "saved catalog");
    Ok(())
}

/// Persisted ordering: type IATA code (absent sorts first as the empty
/// string), then registration.
fn sort_key(record: &AircraftRecord) -> (String, String) {
    (
        record.aircraft_type.iata_code.clone().unwrap_or_default(),
        record.registration.clone(),
    )
}
