//! Airline fleet catalog recorder.
//!
//! This library polls an airline flight-status API and maintains a
//! versioned JSON catalog of the fleet:
//! - Fetch paginated flight records with throttling and key rotation
//! - Extract one aircraft observation per flight
//! - Transform observations into canonical catalog records
//! - Reconcile against the persisted catalog with per-field history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │   Client    │──▶│  Extract /  │──▶│  Reconcile  │──▶│    Store    │
//! │ (HTTP, keys)│   │  Transform  │   │   (diff)    │   │   (JSON)    │
//! └─────────────┘   └─────────────┘   └─────────────┘   └─────────────┘
//!        │                                                     │
//!        └───────────────────────┬─────────────────────────────┘
//!                                ▼
//!                        ┌─────────────┐
//!                        │   Crawler   │
//!                        │(orchestrator)│
//!                        └─────────────┘
//! ```

pub mod client;
pub mod crawler;
pub mod extract;
pub mod reconcile;
pub mod store;
pub mod transform;
pub mod types;

pub use client::{ApiClient, ClientConfig, KeyRing};
pub use crawler::{CrawlConfig, CrawlReport, CrawlStats, Crawler};
pub use extract::{extract, AircraftObservation};
pub use reconcile::{reconcile, ReconcileAction, ReconcileOutcome};
pub use transform::transform;
pub use types::{AircraftRecord, AirlineInfo, Catalog, ChangeEntry};
