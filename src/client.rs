//! Rate-limited HTTP client for the airline flight-status API.

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Header carrying the API key on every request.
const API_KEY_HEADER: &str = "x-api-key";

/// Hard cap on pages per date, to stop unbounded crawling on
/// pathological pagination metadata.
const MAX_PAGES: u32 = 100;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server returned error status: {status}")]
    ServerError { status: StatusCode },
    #[error("All {attempts} API keys rejected (rate limited or unauthorized)")]
    KeysExhausted { attempts: usize },
    #[error("No API keys configured")]
    NoApiKeys,
}

/// Round-robin ring of API keys.
#[derive(Debug, Clone)]
pub struct KeyRing {
    keys: Vec<String>,
    index: usize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Result<Self, ClientError> {
        if keys.is_empty() || keys.iter().any(|k| k.trim().is_empty()) {
            return Err(ClientError::NoApiKeys);
        }
        Ok(Self { keys, index: 0 })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn current(&self) -> &str {
        &self.keys[self.index]
    }

    /// Move to the next key, wrapping around.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.keys.len();
    }
}

/// Configuration for the flight-status API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base endpoint for flight-status queries.
    pub base_url: String,
    /// One or more API keys, rotated round-robin.
    pub api_keys: Vec<String>,
    /// Minimum delay between any two requests, regardless of key.
    pub min_interval: Duration,
    /// Fixed pause before retrying with the next key after a 403/429.
    pub retry_backoff: Duration,
    /// Request timeout.
    pub timeout: Duration,
    /// Flights per page.
    pub page_size: u32,
}

impl ClientConfig {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            base_url: "https://api.flightstatus.example.com/flights".to_string(),
            api_keys,
            min_interval: Duration::from_millis(5000),
            retry_backoff: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One page of flight records with pagination metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightPage {
    pub flights: Vec<Flight>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page_number: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_number: 1,
            total_pages: 1,
        }
    }
}

/// A flight record as returned by the API. Every nested field is
/// optional so that a sparse record never fails deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flight {
    pub flight_number: Option<String>,
    pub legs: Vec<FlightLeg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightLeg {
    pub aircraft: Option<AircraftInfo>,
}

/// Aircraft sub-object of a flight leg.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AircraftInfo {
    pub registration: Option<String>,
    /// IATA type code, e.g. `32N`.
    pub type_code: Option<String>,
    /// ICAO type code, e.g. `A20N`.
    pub type_code_icao: Option<String>,
    /// Free-text type name, e.g. `AIRBUS A320-271N`.
    pub type_name: Option<String>,
    /// IATA code of the owning airline.
    pub owner: Option<String>,
    pub sub_fleet_code: Option<String>,
    pub cabin_crew_employer: Option<String>,
    pub cockpit_crew_employer: Option<String>,
    /// `"Y"` when wifi is installed.
    pub wifi: Option<String>,
    /// `"Y"` when the wifi is high-speed.
    pub high_speed_wifi: Option<String>,
    /// `"Y"` when satellite connectivity is installed.
    pub satellite: Option<String>,
    /// Compact physical cabin configuration, e.g. `J034W024Y266`.
    pub cabin_configuration: Option<String>,
}

/// Client for the flight-status API.
///
/// Owns all throttling and key-rotation state so it can be tested in
/// isolation; nothing here is process-global.
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    keys: KeyRing,
    last_request: Option<Instant>,
    requests: u64,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let keys = KeyRing::new(config.api_keys.clone())?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            keys,
            last_request: None,
            requests: 0,
        })
    }

    /// Total requests issued so far, including retries.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Fetch one page of flights for a date.
    ///
    /// Rotates to the next key before the request when more than one is
    /// configured. A 403/429 response rotates again and retries after a
    /// short backoff; once every key has been tried the error propagates.
    /// Any other non-2xx status is fatal.
    pub async fn fetch_page(
        &mut self,
        date: NaiveDate,
        airline: &str,
        page: u32,
    ) -> Result<FlightPage, ClientError> {
        self.throttle().await;

        if self.keys.len() > 1 {
            self.keys.advance();
        }
        let mut retries_left = self.keys.len() - 1;

        let start = format!("{date}T00:00");
        let end = format!("{date}T23:59");
        let page_size = self.config.page_size.to_string();
        let page_number = page.to_string();

        loop {
            self.last_request = Some(Instant::now());
            self.requests += 1;

            let response = self
                .http
                .get(&self.config.base_url)
                .query(&[
                    ("startDateTime", start.as_str()),
                    ("endDateTime", end.as_str()),
                    ("movementType", "departures"),
                    ("operatingAirline", airline),
                    ("pageSize", page_size.as_str()),
                    ("pageNumber", page_number.as_str()),
                ])
                .header(API_KEY_HEADER, self.keys.current())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                if retries_left == 0 {
                    return Err(ClientError::KeysExhausted {
                        attempts: self.keys.len(),
                    });
                }
                retries_left -= 1;
                tracing::warn!(%status, "request rejected, rotating API key");
                self.keys.advance();
                sleep(self.config.retry_backoff).await;
                continue;
            }

            return Err(ClientError::ServerError { status });
        }
    }

    /// Fetch every page of flights for a date, in page order.
    pub async fn fetch_day(
        &mut self,
        date: NaiveDate,
        airline: &str,
    ) -> Result<Vec<Flight>, ClientError> {
        let mut flights = Vec::new();
        let mut page = 1u32;

        loop {
            let batch = self.fetch_page(date, airline, page).await?;
            let total_pages = batch.pagination.total_pages;
            tracing::debug!(
                %date,
                page,
                total_pages,
                flights = batch.flights.len(),
                "fetched page"
            );
            flights.extend(batch.flights);

            if page >= total_pages {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(%date, "page cap reached, stopping pagination");
                break;
            }
            page += 1;
        }

        Ok(flights)
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.config.min_interval {
                sleep(self.config.min_interval - elapsed).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    fn fast_config(keys: Vec<&str>, base_url: String) -> ClientConfig {
        ClientConfig::new(keys.into_iter().map(String::from).collect())
            .with_base_url(base_url)
            .with_min_interval(Duration::from_millis(0))
            .with_retry_backoff(Duration::from_millis(1))
    }

    /// Minimal HTTP server that answers every request with a fixed
    /// status and body, recording the API key header of each request.
    async fn spawn_server(
        status_line: &'static str,
        body: &'static str,
        seen_keys: Arc<Mutex<Vec<String>>>,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let seen = Arc::clone(&seen_keys);
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while read < buf.len() {
                        let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        read += n;
                        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let request = String::from_utf8_lossy(&buf[..read]).to_string();
                    for line in request.lines() {
                        if let Some((name, value)) = line.split_once(':') {
                            if name.eq_ignore_ascii_case(API_KEY_HEADER) {
                                seen.lock().unwrap().push(value.trim().to_string());
                            }
                        }
                    }

                    let response = format!(
                        "{status_line}\r\ncontent-type: application/json\r\n\
                         content-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn key_ring_rotates_round_robin() {
        let mut ring = KeyRing::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(ring.current(), "a");
        ring.advance();
        assert_eq!(ring.current(), "b");
        ring.advance();
        ring.advance();
        assert_eq!(ring.current(), "a");
    }

    #[test]
    fn key_ring_rejects_empty() {
        assert!(matches!(
            KeyRing::new(Vec::new()),
            Err(ClientError::NoApiKeys)
        ));
        assert!(matches!(
            KeyRing::new(vec!["".into()]),
            Err(ClientError::NoApiKeys)
        ));
    }

    #[tokio::test]
    async fn repeated_429_exhausts_all_keys() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_server("HTTP/1.1 429 Too Many Requests", "", Arc::clone(&seen)).await;
        let mut client =
            ApiClient::new(fast_config(vec!["k1", "k2", "k3"], url)).unwrap();

        let result = client.fetch_page(test_date(), "LH", 1).await;
        assert!(matches!(
            result,
            Err(ClientError::KeysExhausted { attempts: 3 })
        ));

        let mut keys = seen.lock().unwrap().clone();
        assert_eq!(keys.len(), 3);
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 3, "each attempt must use a distinct key");
        assert_eq!(client.requests(), 3);
    }

    #[tokio::test]
    async fn other_server_errors_are_fatal() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_server("HTTP/1.1 500 Internal Server Error", "", Arc::clone(&seen)).await;
        let mut client = ApiClient::new(fast_config(vec!["k1", "k2"], url)).unwrap();

        let result = client.fetch_page(test_date(), "LH", 1).await;
        assert!(matches!(result, Err(ClientError::ServerError { .. })));
        // No rotation/retry for non-auth errors.
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_day_stops_at_last_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let body = r#"{"flights":[{"flightNumber":"LH400","legs":[]}],"pagination":{"pageNumber":1,"totalPages":1}}"#;
        let url = spawn_server("HTTP/1.1 200 OK", body, Arc::clone(&seen)).await;
        let mut client = ApiClient::new(fast_config(vec!["k1"], url)).unwrap();

        let flights = client.fetch_day(test_date(), "LH").await.unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].flight_number.as_deref(), Some("LH400"));
        assert_eq!(client.requests(), 1);
    }

    #[test]
    fn sparse_flight_record_deserializes() {
        let flight: Flight = serde_json::from_str(r#"{"legs":[{}]}"#).unwrap();
        assert!(flight.flight_number.is_none());
        assert!(flight.legs[0].aircraft.is_none());
    }
}
