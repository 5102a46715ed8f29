//! Conversion of raw observations into canonical catalog records.
//!
//! Everything here is pure: no I/O, no clock beyond stamping the
//! creation instant, so the whole module is directly unit-testable.

use chrono::{NaiveDate, Utc};

use crate::extract::AircraftObservation;
use crate::types::{
    AircraftRecord, AircraftStatus, AircraftType, Cabin, CabinClasses, Connectivity, Metadata,
    Operator, Tracking, WifiStatus,
};

/// The API marks boolean-ish flags with this value when set.
const AFFIRMATIVE: &str = "Y";

/// Provider installed on high-speed-wifi airframes.
const HIGH_SPEED_PROVIDER: &str = "Starlink";

/// Build a fresh catalog record from one observation.
///
/// `first_seen`/`last_seen` are both the observation date and
/// `total_flights` starts at 1; the reconciler decides what survives
/// when an existing record is present.
pub fn transform(obs: &AircraftObservation, observation_date: NaiveDate) -> AircraftRecord {
    let now = Utc::now();
    let (classes, total_seats) =
        parse_cabin_configuration(obs.cabin_configuration.as_deref().unwrap_or(""));

    AircraftRecord {
        registration: obs.registration.clone(),
        aircraft_type: infer_aircraft_type(obs),
        operator: Operator {
            sub_fleet_code: obs.sub_fleet_code.clone(),
            cabin_crew_employer: obs.cabin_crew_employer.clone(),
            cockpit_crew_employer: obs.cockpit_crew_employer.clone(),
        },
        cabin: Cabin {
            physical_configuration: obs.cabin_configuration.clone(),
            saleable_configuration: None,
            total_seats,
            classes,
            freight_configuration: None,
        },
        connectivity: classify_connectivity(obs),
        status: AircraftStatus::Active,
        tracking: Tracking {
            first_seen: observation_date,
            last_seen: observation_date,
            total_flights: 1,
        },
        metadata: Metadata {
            created_at: now,
            updated_at: now,
        },
        history: Vec::new(),
    }
}

/// Parse a compact cabin configuration like `J034W024Y266`.
///
/// Tokens are `<letter><2-3 digit count>`. {P,F} map to first, {J,C} to
/// business, {W,S} to premium economy, {Y,M} to economy; unknown
/// letters are skipped. The total is the sum of recognized counts and
/// absent when nothing parses.
pub fn parse_cabin_configuration(config: &str) -> (CabinClasses, Option<u32>) {
    let mut classes = CabinClasses::default();
    let mut total: Option<u32> = None;

    let mut chars = config.chars().peekable();
    while let Some(letter) = chars.next() {
        if !letter.is_ascii_alphabetic() {
            continue;
        }

        let mut digits = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(*c);
                chars.next();
            } else {
                break;
            }
        }
        if digits.len() < 2 || digits.len() > 3 {
            continue;
        }
        let Ok(count) = digits.parse::<u32>() else {
            continue;
        };

        let slot = match letter.to_ascii_uppercase() {
            'P' | 'F' => Some(&mut classes.first),
            'J' | 'C' => Some(&mut classes.business),
            'W' | 'S' => Some(&mut classes.premium_economy),
            'Y' | 'M' => Some(&mut classes.economy),
            _ => None,
        };
        if let Some(slot) = slot {
            // Saturate: the configuration string comes straight off the
            // wire and must not be able to overflow the counters.
            *slot = slot.saturating_add(count);
            total = Some(total.unwrap_or(0).saturating_add(count));
        }
    }

    (classes, total)
}

/// Classify wifi and satellite connectivity from the raw flags.
pub fn classify_connectivity(obs: &AircraftObservation) -> Connectivity {
    let wifi_enabled = obs.wifi_flag.as_deref() == Some(AFFIRMATIVE);
    let high_speed = obs.high_speed_wifi_flag.as_deref() == Some(AFFIRMATIVE);

    let wifi = if !wifi_enabled {
        WifiStatus::None
    } else if high_speed {
        WifiStatus::HighSpeed
    } else {
        WifiStatus::LowSpeed
    };

    let wifi_provider = if wifi_enabled && high_speed {
        Some(HIGH_SPEED_PROVIDER.to_string())
    } else {
        None
    };

    Connectivity {
        wifi,
        wifi_provider,
        satellite: obs.satellite_flag.as_deref() == Some(AFFIRMATIVE),
    }
}

/// Best-effort aircraft type from the codes and free-text name.
pub fn infer_aircraft_type(obs: &AircraftObservation) -> AircraftType {
    let name = obs.type_name.as_deref().unwrap_or("");
    AircraftType {
        iata_code: obs.type_code.clone(),
        icao_code: obs.type_code_icao.clone(),
        manufacturer: guess_manufacturer(name),
        model: guess_model(name),
        variant: guess_variant(name),
        full_name: obs.type_name.clone(),
    }
}

fn guess_manufacturer(name: &str) -> Option<String> {
    let upper = name.to_ascii_uppercase();
    if upper.contains("AIRBUS") {
        Some("Airbus".to_string())
    } else if upper.contains("BOEING") {
        Some("Boeing".to_string())
    } else if upper.contains("EMBRAER") {
        Some("Embraer".to_string())
    } else {
        None
    }
}

/// `A` followed by three digits (Airbus style), otherwise the first
/// run of exactly three digits (e.g. `777`, `190`).
fn guess_model(name: &str) -> Option<String> {
    let chars: Vec<char> = name.to_ascii_uppercase().chars().collect();

    for i in 0..chars.len().saturating_sub(3) {
        if chars[i] == 'A' && chars[i + 1..i + 4].iter().all(char::is_ascii_digit) {
            return Some(chars[i..i + 4].iter().collect());
        }
    }

    let mut run_start: Option<usize> = None;
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            run_start.get_or_insert(i);
        } else {
            if let Some(start) = run_start {
                if i - start == 3 {
                    return Some(chars[start..i].iter().collect());
                }
            }
            run_start = None;
        }
    }
    if let Some(start) = run_start {
        if chars.len() - start == 3 {
            return Some(chars[start..].iter().collect());
        }
    }

    None
}

/// Digits immediately following the first hyphen, e.g. `787-9` → `9`.
fn guess_variant(name: &str) -> Option<String> {
    let (idx, _) = name.char_indices().find(|(_, c)| *c == '-')?;
    let digits: String = name[idx + 1..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> AircraftObservation {
        AircraftObservation {
            registration: "D-AIMA".to_string(),
            type_code: Some("388".to_string()),
            type_code_icao: Some("A388".to_string()),
            type_name: Some("AIRBUS A380-800".to_string()),
            sub_fleet_code: Some("388V1".to_string()),
            cabin_crew_employer: Some("LH".to_string()),
            cockpit_crew_employer: Some("LH".to_string()),
            wifi_flag: None,
            high_speed_wifi_flag: None,
            satellite_flag: None,
            cabin_configuration: Some("J034W024Y266".to_string()),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    #[test]
    fn cabin_parsing_sums_classes() {
        let (classes, total) = parse_cabin_configuration("J034W024Y266");
        assert_eq!(classes.business, 34);
        assert_eq!(classes.premium_economy, 24);
        assert_eq!(classes.economy, 266);
        assert_eq!(classes.first, 0);
        assert_eq!(total, Some(324));
    }

    #[test]
    fn cabin_parsing_is_order_independent() {
        let (a, total_a) = parse_cabin_configuration("Y266J034W024");
        let (b, total_b) = parse_cabin_configuration("J034W024Y266");
        assert_eq!(a, b);
        assert_eq!(total_a, total_b);
    }

    #[test]
    fn cabin_parsing_handles_garbage() {
        for garbage in ["", "!!??", "J1", "XYZ", "1234"] {
            let (classes, total) = parse_cabin_configuration(garbage);
            assert_eq!(classes, CabinClasses::default(), "input: {garbage:?}");
            assert_eq!(total, None, "input: {garbage:?}");
        }
    }

    #[test]
    fn cabin_parsing_saturates_instead_of_overflowing() {
        // Enough repeated tokens to push the economy count past u32::MAX.
        let config = "Y999".repeat(4_300_000);
        let (classes, total) = parse_cabin_configuration(&config);
        assert_eq!(classes.economy, u32::MAX);
        assert_eq!(total, Some(u32::MAX));
    }

    #[test]
    fn cabin_parsing_skips_unknown_letters() {
        // Unknown class letter Z contributes nothing, known ones still count.
        let (classes, total) = parse_cabin_configuration("Z010C048M120");
        assert_eq!(classes.business, 48);
        assert_eq!(classes.economy, 120);
        assert_eq!(total, Some(168));
    }

    #[test]
    fn wifi_disabled_means_none_regardless_of_speed_flag() {
        let mut obs = observation();
        obs.wifi_flag = None;
        obs.high_speed_wifi_flag = Some("Y".to_string());

        let conn = classify_connectivity(&obs);
        assert_eq!(conn.wifi, WifiStatus::None);
        assert_eq!(conn.wifi_provider, None);
    }

    #[test]
    fn high_speed_wifi_gets_provider() {
        let mut obs = observation();
        obs.wifi_flag = Some("Y".to_string());
        obs.high_speed_wifi_flag = Some("Y".to_string());

        let conn = classify_connectivity(&obs);
        assert_eq!(conn.wifi, WifiStatus::HighSpeed);
        assert_eq!(conn.wifi_provider.as_deref(), Some("Starlink"));
    }

    #[test]
    fn low_speed_wifi_has_no_provider() {
        let mut obs = observation();
        obs.wifi_flag = Some("Y".to_string());
        obs.high_speed_wifi_flag = Some("N".to_string());

        let conn = classify_connectivity(&obs);
        assert_eq!(conn.wifi, WifiStatus::LowSpeed);
        assert_eq!(conn.wifi_provider, None);
    }

    #[test]
    fn satellite_flag_is_exact_match() {
        let mut obs = observation();
        obs.satellite_flag = Some("Y".to_string());
        assert!(classify_connectivity(&obs).satellite);

        obs.satellite_flag = Some("yes".to_string());
        assert!(!classify_connectivity(&obs).satellite);
    }

    #[test]
    fn type_heuristics_airbus() {
        let obs = observation();
        let t = infer_aircraft_type(&obs);
        assert_eq!(t.manufacturer.as_deref(), Some("Airbus"));
        assert_eq!(t.model.as_deref(), Some("A380"));
        assert_eq!(t.variant.as_deref(), Some("800"));
        assert_eq!(t.full_name.as_deref(), Some("AIRBUS A380-800"));
    }

    #[test]
    fn type_heuristics_boeing_bare_code() {
        let mut obs = observation();
        obs.type_name = Some("BOEING 787-9".to_string());
        let t = infer_aircraft_type(&obs);
        assert_eq!(t.manufacturer.as_deref(), Some("Boeing"));
        assert_eq!(t.model.as_deref(), Some("787"));
        assert_eq!(t.variant.as_deref(), Some("9"));
    }

    #[test]
    fn type_heuristics_tolerate_unknown_names() {
        let mut obs = observation();
        obs.type_name = Some("DE HAVILLAND DASH 8".to_string());
        let t = infer_aircraft_type(&obs);
        assert_eq!(t.manufacturer, None);
        assert_eq!(t.model, None);
        assert_eq!(t.variant, None);

        obs.type_name = None;
        let t = infer_aircraft_type(&obs);
        assert_eq!(t.full_name, None);
    }

    #[test]
    fn transform_initializes_tracking() {
        let record = transform(&observation(), date());
        assert_eq!(record.registration, "D-AIMA");
        assert_eq!(record.tracking.first_seen, date());
        assert_eq!(record.tracking.last_seen, date());
        assert_eq!(record.tracking.total_flights, 1);
        assert_eq!(record.cabin.total_seats, Some(324));
        assert!(record.history.is_empty());
        assert_eq!(record.status, AircraftStatus::Active);
    }
}
