//! Core data types for the fleet catalog.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current catalog schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Airlines this tool knows how to crawl.
const SUPPORTED_AIRLINES: &[(&str, &str)] = &[("LH", "Lufthansa"), ("CL", "Lufthansa CityLine")];

/// Airline descriptor stored at the top of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineInfo {
    pub iata_code: String,
    pub name: String,
}

impl AirlineInfo {
    /// Look up a supported airline by IATA code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        SUPPORTED_AIRLINES
            .iter()
            .find(|(iata, _)| iata.eq_ignore_ascii_case(code))
            .map(|(iata, name)| Self {
                iata_code: (*iata).to_string(),
                name: (*name).to_string(),
            })
    }
}

/// Onboard wifi service level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiStatus {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "low-speed")]
    LowSpeed,
    #[serde(rename = "high-speed")]
    HighSpeed,
}

impl fmt::Display for WifiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::LowSpeed => "low-speed",
            Self::HighSpeed => "high-speed",
        };
        f.write_str(s)
    }
}

/// Aircraft lifecycle marker. Observed aircraft are always `Active`;
/// the other states exist for manual catalog edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftStatus {
    #[default]
    Active,
    Stored,
    Retired,
}

/// Best-effort aircraft type description. All fields may legitimately
/// be absent; failure to infer them is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AircraftType {
    pub iata_code: Option<String>,
    pub icao_code: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Operator {
    pub sub_fleet_code: Option<String>,
    pub cabin_crew_employer: Option<String>,
    pub cockpit_crew_employer: Option<String>,
}

/// Seat counts per canonical cabin class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CabinClasses {
    pub first: u32,
    pub business: u32,
    pub premium_economy: u32,
    pub economy: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cabin {
    /// Compact configuration code as reported, e.g. `J034W024Y266`.
    pub physical_configuration: Option<String>,
    pub saleable_configuration: Option<String>,
    /// Sum of all parsed class counts; absent when the configuration
    /// string is empty or unparseable.
    pub total_seats: Option<u32>,
    pub classes: CabinClasses,
    pub freight_configuration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connectivity {
    pub wifi: WifiStatus,
    pub wifi_provider: Option<String>,
    pub satellite: bool,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self {
            wifi: WifiStatus::None,
            wifi_provider: None,
            satellite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracking {
    /// Date of the first observation. Immutable once set.
    pub first_seen: NaiveDate,
    /// Date of the most recent observation. Monotonically non-decreasing.
    pub last_seen: NaiveDate,
    /// Number of observations so far. Monotonically increasing.
    pub total_flights: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Record creation instant. Immutable once set.
    pub created_at: DateTime<Utc>,
    /// Instant of the last mutation.
    pub updated_at: DateTime<Utc>,
}

/// One recorded change to a tracked property of an aircraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub timestamp: NaiveDate,
    /// Dotted property path, e.g. `connectivity.wifi`.
    pub property: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source: String,
}

impl ChangeEntry {
    /// Structural uniqueness check: two entries describe the same change
    /// when timestamp, property and both values match. `source` is not
    /// part of the key.
    pub fn same_change(&self, other: &ChangeEntry) -> bool {
        self.timestamp == other.timestamp
            && self.property == other.property
            && self.old_value == other.old_value
            && self.new_value == other.new_value
    }
}

/// One aircraft in the catalog, keyed by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftRecord {
    pub registration: String,
    pub aircraft_type: AircraftType,
    pub operator: Operator,
    pub cabin: Cabin,
    pub connectivity: Connectivity,
    #[serde(default)]
    pub status: AircraftStatus,
    pub tracking: Tracking,
    pub metadata: Metadata,
    /// Append-only, deduplicated change history.
    #[serde(default)]
    pub history: Vec<ChangeEntry>,
}

/// Whole-airline fleet catalog as persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub schema_version: u32,
    pub airline: AirlineInfo,
    pub generated_at: DateTime<Utc>,
    pub aircraft_count: usize,
    pub aircraft: Vec<AircraftRecord>,
}

impl Catalog {
    /// Create an empty catalog for an airline.
    pub fn new(airline: AirlineInfo) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            airline,
            generated_at: Utc::now(),
            aircraft_count: 0,
            aircraft: Vec::new(),
        }
    }

    /// Look up an aircraft by registration.
    pub fn get(&self, registration: &str) -> Option<&AircraftRecord> {
        self.aircraft
            .iter()
            .find(|r| r.registration == registration)
    }

    /// Insert or replace the record for its registration.
    pub fn upsert(&mut self, record: AircraftRecord) {
        match self
            .aircraft
            .iter_mut()
            .find(|r| r.registration == record.registration)
        {
            Some(existing) => *existing = record,
            None => self.aircraft.push(record),
        }
        self.aircraft_count = self.aircraft.len();
    }
}
