//! Demo tours for trying the optimizer.
//!
//! Two field-service days:
//! - Munich (12 customer stops, start at the office)
//! - Philadelphia (10 customer stops, no start; the first stop anchors)
//!
//! Stops are shuffled with a fixed seed so the submitted order is not
//! already a good tour.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::domain::{GeoPoint, Stop};

/// A named set of stops with an optional start location.
#[derive(Debug, Clone)]
pub struct DemoTour {
    pub name: &'static str,
    pub start: Option<GeoPoint>,
    pub stops: Vec<Stop>,
}

/// Stop data with name, address and coordinates.
struct StopData {
    name: &'static str,
    address: &'static str,
    lat: f64,
    lng: f64,
}

// ============================================================================
// Munich Data
// ============================================================================

const MUNICH_OFFICE: GeoPoint = GeoPoint { lat: 48.1372, lng: 11.5755 };

const MUNICH_STOPS: &[StopData] = &[
    StopData { name: "Schreinerei Bauer", address: "Karlsplatz 8", lat: 48.1402, lng: 11.5595 },
    StopData { name: "Praxis Dr. Huber", address: "Leopoldstr. 44", lat: 48.1595, lng: 11.5860 },
    StopData { name: "Café am Dom", address: "Frauenplatz 11", lat: 48.1386, lng: 11.5736 },
    StopData { name: "Autohaus Meier", address: "Landsberger Str. 300", lat: 48.1425, lng: 11.5020 },
    StopData { name: "Kanzlei Schmid", address: "Maximilianstr. 30", lat: 48.1393, lng: 11.5850 },
    StopData { name: "Bäckerei Wagner", address: "Rosenheimer Str. 120", lat: 48.1240, lng: 11.6010 },
    StopData { name: "Hotel Isartor", address: "Thierschstr. 2", lat: 48.1346, lng: 11.5827 },
    StopData { name: "Elektro Fischer", address: "Dachauer Str. 190", lat: 48.1620, lng: 11.5410 },
    StopData { name: "Blumen Weber", address: "Schwanthalerstr. 80", lat: 48.1362, lng: 11.5490 },
    StopData { name: "Sanitär Koch", address: "Ungererstr. 150", lat: 48.1730, lng: 11.5950 },
    StopData { name: "Optik Richter", address: "Sendlinger Str. 37", lat: 48.1345, lng: 11.5690 },
    StopData { name: "Druckerei Klein", address: "Tegernseer Landstr. 75", lat: 48.1100, lng: 11.5790 },
];

// ============================================================================
// Philadelphia Data
// ============================================================================

const PHILADELPHIA_STOPS: &[StopData] = &[
    StopData { name: "Reading Terminal Market", address: "51 N 12th St", lat: 39.9535, lng: -75.1589 },
    StopData { name: "Rittenhouse Dental", address: "1601 Walnut St", lat: 39.9496, lng: -75.1680 },
    StopData { name: "Old City Print Shop", address: "230 Market St", lat: 39.9500, lng: -75.1450 },
    StopData { name: "Fishtown Brewing", address: "1200 Frankford Ave", lat: 39.9690, lng: -75.1340 },
    StopData { name: "Drexel Facilities", address: "3141 Chestnut St", lat: 39.9566, lng: -75.1899 },
    StopData { name: "Queen Village Hardware", address: "700 S 4th St", lat: 39.9395, lng: -75.1498 },
    StopData { name: "Fairmount Bikes", address: "2015 Fairmount Ave", lat: 39.9672, lng: -75.1718 },
    StopData { name: "East Passyunk Bakery", address: "1800 E Passyunk Ave", lat: 39.9285, lng: -75.1650 },
    StopData { name: "Northern Liberties Gym", address: "1000 N 2nd St", lat: 39.9665, lng: -75.1405 },
    StopData { name: "Spring Garden Florist", address: "1500 Spring Garden St", lat: 39.9625, lng: -75.1625 },
];

fn build_tour(
    name: &'static str,
    prefix: &str,
    seed: u64,
    start: Option<GeoPoint>,
    data: &[StopData],
) -> DemoTour {
    let mut stops: Vec<Stop> = data
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Stop::new(format!("{}-{:03}", prefix, i + 1), d.name, GeoPoint::new(d.lat, d.lng))
                .with_address(d.address)
        })
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    stops.shuffle(&mut rng);

    DemoTour { name, start, stops }
}

/// Munich demo tour starting at the office.
///
/// # Examples
///
/// ```
/// use tour_routing::demo_data::generate_munich;
///
/// let tour = generate_munich();
/// assert_eq!(tour.name, "Munich");
/// assert_eq!(tour.stops.len(), 12);
/// assert!(tour.start.is_some());
/// ```
pub fn generate_munich() -> DemoTour {
    build_tour("Munich", "muc", 0, Some(MUNICH_OFFICE), MUNICH_STOPS)
}

/// Philadelphia demo tour without a start location.
pub fn generate_philadelphia() -> DemoTour {
    build_tour("Philadelphia", "phl", 1, None, PHILADELPHIA_STOPS)
}

/// Returns all available demo tour names.
pub fn available_datasets() -> &'static [&'static str] {
    &["MUNICH", "PHILADELPHIA"]
}

/// Generates a demo tour by name (case-insensitive).
///
/// # Examples
///
/// ```
/// use tour_routing::demo_data::generate_by_name;
///
/// assert_eq!(generate_by_name("philadelphia").unwrap().name, "Philadelphia");
/// assert!(generate_by_name("UNKNOWN").is_none());
/// ```
pub fn generate_by_name(name: &str) -> Option<DemoTour> {
    match name.to_uppercase().as_str() {
        "MUNICH" => Some(generate_munich()),
        "PHILADELPHIA" => Some(generate_philadelphia()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_dataset_resolves() {
        for name in available_datasets() {
            assert!(generate_by_name(name).is_some(), "{}", name);
        }
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        assert_eq!(generate_munich().stops, generate_munich().stops);
    }

    #[test]
    fn test_ids_unique_and_coordinates_valid() {
        for name in available_datasets() {
            let tour = generate_by_name(name).unwrap();
            let ids: HashSet<_> = tour.stops.iter().map(|s| s.id.clone()).collect();
            assert_eq!(ids.len(), tour.stops.len());
            assert!(tour.stops.iter().all(|s| s.location.is_valid()));
        }
    }
}
