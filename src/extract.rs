//! Extraction of aircraft observations from raw flight records.

use crate::client::Flight;

/// One flattened aircraft sighting pulled out of a flight record.
///
/// Connectivity flags are kept as the raw API strings; the transformer
/// decides what counts as affirmative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AircraftObservation {
    pub registration: String,
    pub type_code: Option<String>,
    pub type_code_icao: Option<String>,
    pub type_name: Option<String>,
    pub sub_fleet_code: Option<String>,
    pub cabin_crew_employer: Option<String>,
    pub cockpit_crew_employer: Option<String>,
    pub wifi_flag: Option<String>,
    pub high_speed_wifi_flag: Option<String>,
    pub satellite_flag: Option<String>,
    pub cabin_configuration: Option<String>,
}

/// Pull the aircraft observation out of a flight record, if any.
///
/// Reads the first leg's aircraft object. Returns `None` when there is
/// no registration, or when the aircraft is owned by a different
/// airline than requested (flights are sometimes operated with
/// equipment owned by another carrier; only owner matches are kept).
pub fn extract(flight: &Flight, airline: &str) -> Option<AircraftObservation> {
    let aircraft = flight.legs.first()?.aircraft.as_ref()?;
    let registration = aircraft.registration.clone()?;

    if aircraft.owner.as_deref() != Some(airline) {
        return None;
    }

    Some(AircraftObservation {
        registration,
        type_code: aircraft.type_code.clone(),
        type_code_icao: aircraft.type_code_icao.clone(),
        type_name: aircraft.type_name.clone(),
        sub_fleet_code: aircraft.sub_fleet_code.clone(),
        cabin_crew_employer: aircraft.cabin_crew_employer.clone(),
        cockpit_crew_employer: aircraft.cockpit_crew_employer.clone(),
        wifi_flag: aircraft.wifi.clone(),
        high_speed_wifi_flag: aircraft.high_speed_wifi.clone(),
        satellite_flag: aircraft.satellite.clone(),
        cabin_configuration: aircraft.cabin_configuration.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AircraftInfo, FlightLeg};

    fn flight_with(aircraft: AircraftInfo) -> Flight {
        Flight {
            flight_number: Some("LH400".to_string()),
            legs: vec![FlightLeg {
                aircraft: Some(aircraft),
            }],
        }
    }

    #[test]
    fn extracts_owner_matching_aircraft() {
        let flight = flight_with(AircraftInfo {
            registration: Some("D-AIMA".to_string()),
            owner: Some("LH".to_string()),
            type_name: Some("AIRBUS A380-800".to_string()),
            cabin_configuration: Some("F008J078W052Y371".to_string()),
            ..AircraftInfo::default()
        });

        let obs = extract(&flight, "LH").unwrap();
        assert_eq!(obs.registration, "D-AIMA");
        assert_eq!(obs.type_name.as_deref(), Some("AIRBUS A380-800"));
        assert_eq!(
            obs.cabin_configuration.as_deref(),
            Some("F008J078W052Y371")
        );
    }

    #[test]
    fn rejects_foreign_owned_equipment() {
        let flight = flight_with(AircraftInfo {
            registration: Some("OE-LBS".to_string()),
            owner: Some("OS".to_string()),
            ..AircraftInfo::default()
        });
        assert!(extract(&flight, "LH").is_none());
    }

    #[test]
    fn rejects_missing_registration_or_aircraft() {
        let flight = flight_with(AircraftInfo {
            owner: Some("LH".to_string()),
            ..AircraftInfo::default()
        });
        assert!(extract(&flight, "LH").is_none());

        let empty = Flight::default();
        assert!(extract(&empty, "LH").is_none());

        let legless = Flight {
            flight_number: None,
            legs: vec![FlightLeg { aircraft: None }],
        };
        assert!(extract(&legless, "LH").is_none());
    }
}
