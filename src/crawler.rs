//! Crawl orchestration: one or many dates, reconciled into the catalog.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::client::{ApiClient, ClientError};
use crate::extract::{extract, AircraftObservation};
use crate::reconcile::{reconcile, ReconcileAction};
use crate::store::{self, StoreError};
use crate::transform::transform;
use crate::types::{AirlineInfo, Catalog, ChangeEntry};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Export serialization error: {0}")]
    Export(#[from] serde_json::Error),
}

/// Configuration for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub airline: AirlineInfo,
    pub catalog_path: PathBuf,
    /// Compute everything but write nothing.
    pub dry_run: bool,
    /// Single-day mode target; defaults to today.
    pub target_date: Option<NaiveDate>,
    /// Bootstrap mode: crawl this many consecutive days ending today,
    /// starting from an empty catalog.
    pub bootstrap_days: Option<u32>,
    /// Days without a sighting before an aircraft is reported stale.
    pub stale_days: i64,
    /// Optional JSON export of all observed changes.
    pub export_path: Option<PathBuf>,
}

impl CrawlConfig {
    pub fn new(airline: AirlineInfo, catalog_path: PathBuf) -> Self {
        Self {
            airline,
            catalog_path,
            dry_run: false,
            target_date: None,
            bootstrap_days: None,
            stale_days: 30,
            export_path: None,
        }
    }
}

/// Run-wide reconciliation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub created: u64,
    pub updated: u64,
    pub seen: u64,
}

impl CrawlStats {
    /// Aircraft touched in any way this run.
    pub fn touched(&self) -> u64 {
        self.created + self.updated + self.seen
    }
}

/// A change entry annotated with the aircraft it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationChange {
    pub registration: String,
    #[serde(flatten)]
    pub change: ChangeEntry,
}

/// Shape of the optional changes export file.
#[derive(Debug, Serialize)]
struct ChangesExport<'a> {
    generated_at: DateTime<Utc>,
    airline: &'a str,
    changes: &'a [RegistrationChange],
}

/// Summary of a finished crawl.
#[derive(Debug)]
pub struct CrawlReport {
    pub stats: CrawlStats,
    pub changes: Vec<RegistrationChange>,
    pub stale: Vec<String>,
    pub requests: u64,
    pub persisted: bool,
}

/// Drives the fetch → extract → transform → reconcile → persist flow.
pub struct Crawler {
    client: ApiClient,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(client: ApiClient, config: CrawlConfig) -> Self {
        Self { client, config }
    }

    pub async fn run(mut self) -> Result<CrawlReport, CrawlError> {
        let today = Utc::now().date_naive();
        let bootstrap = self.config.bootstrap_days.is_some();
        let dates = crawl_dates(today, self.config.target_date, self.config.bootstrap_days);
        let airline_code = self.config.airline.iata_code.clone();

        let mut catalog = if bootstrap {
            tracing::info!(days = dates.len(), "bootstrap: starting from an empty catalog");
            Catalog::new(self.config.airline.clone())
        } else {
            store::load(&self.config.catalog_path)?
                .unwrap_or_else(|| Catalog::new(self.config.airline.clone()))
        };

        let mut stats = CrawlStats::default();
        let mut changes: Vec<RegistrationChange> = Vec::new();
        let mut observed: HashSet<String> = HashSet::new();

        for date in dates {
            tracing::info!(%date, airline = %airline_code, "processing date");
            let flights = self.client.fetch_day(date, &airline_code).await?;

            // Last observation per registration wins for the date;
            // BTreeMap keeps the reconciliation order deterministic.
            let mut observations: BTreeMap<String, AircraftObservation> = BTreeMap::new();
            for flight in &flights {
                if let Some(obs) = extract(flight, &airline_code) {
                    observations.insert(obs.registration.clone(), obs);
                }
            }
            tracing::info!(
                %date,
                flights = flights.len(),
                aircraft = observations.len(),
                "extracted observations"
            );

            for (registration, obs) in observations {
                observed.insert(registration.clone());

                let incoming = transform(&obs, date);
                let outcome = reconcile(catalog.get(&registration), incoming, date);

                match outcome.action {
                    ReconcileAction::Created => {
                        stats.created += 1;
                        tracing::info!(%registration, "new aircraft");
                    }
                    ReconcileAction::Updated => {
                        stats.updated += 1;
                        tracing::info!(
                            %registration,
                            changes = outcome.changes.len(),
                            "aircraft updated"
                        );
                    }
                    ReconcileAction::Seen => {
                        stats.seen += 1;
                        tracing::debug!(%registration, "aircraft re-seen");
                    }
                }

                for change in &outcome.changes {
                    changes.push(RegistrationChange {
                        registration: registration.clone(),
                        change: change.clone(),
                    });
                }

                if !self.config.dry_run {
                    catalog.upsert(outcome.record);
                }
            }
        }

        let stale = if bootstrap {
            Vec::new()
        } else {
            stale_registrations(&catalog, &observed, today, self.config.stale_days)
        };
        for registration in &stale {
            tracing::warn!(%registration, "aircraft not observed recently, flagged stale");
        }

        let persisted = !self.config.dry_run && stats.touched() > 0;
        if persisted {
            store::save(&self.config.catalog_path, &mut catalog)?;
        } else if self.config.dry_run {
            tracing::info!("dry run, catalog not written");
        }

        if !self.config.dry_run {
            if let Some(export_path) = &self.config.export_path {
                if changes.is_empty() {
                    tracing::info!("no changes observed, skipping export");
                } else {
                    write_changes_export(export_path, &airline_code, &changes)?;
                }
            }
        }

        Ok(CrawlReport {
            stats,
            changes,
            stale,
            requests: self.client.requests(),
            persisted,
        })
    }
}

/// The list of dates a run processes, in chronological order.
pub fn crawl_dates(
    today: NaiveDate,
    target_date: Option<NaiveDate>,
    bootstrap_days: Option<u32>,
) -> Vec<NaiveDate> {
    match bootstrap_days {
        Some(days) => {
            let days = days.max(1);
            (0..days)
                .rev()
                .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
                .collect()
        }
        None => vec![target_date.unwrap_or(today)],
    }
}

/// Catalog entries not observed this run whose last sighting is older
/// than the threshold. Reported only; nothing is ever deleted.
pub fn stale_registrations(
    catalog: &Catalog,
    observed: &HashSet<String>,
    today: NaiveDate,
    stale_days: i64,
) -> Vec<String> {
    catalog
        .aircraft
        .iter()
        .filter(|record| !observed.contains(&record.registration))
        .filter(|record| {
            today.signed_duration_since(record.tracking.last_seen).num_days() > stale_days
        })
        .map(|record| record.registration.clone())
        .collect()
}

fn write_changes_export(
    path: &Path,
    airline: &str,
    changes: &[RegistrationChange],
) -> Result<(), CrawlError> {
    let export = ChangesExport {
        generated_at: Utc::now(),
        airline,
        changes,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut json = serde_json::to_string_pretty(&export)?;
    json.push('\n');
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), changes = changes.len(), "wrote changes export");
    Ok(())
}
