//! OSRM Trip service client.
//!
//! Requests the fixed-start, open-ended trip variant:
//! `GET {base}/trip/v1/driving/{lng,lat;...}?source=first&roundtrip=false`.
//!
//! OSRM lists `waypoints` in input order; each waypoint's `waypoint_index`
//! is its position within the trip. Visiting order is therefore recovered by
//! sorting on `waypoint_index`, and the waypoint's array position is the
//! original index.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{http_client, is_permutation, RoutingProvider, DEFAULT_TIMEOUT};
use crate::domain::{GeoPoint, IndexedPoint, RouteResult};
use crate::error::RoutingError;

const PROVIDER: &str = "osrm";

/// Public OSRM demo server.
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// Trip-optimizing provider backed by an OSRM server.
pub struct OsrmTripProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OsrmTripProvider {
    /// Creates a provider for the OSRM server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, RoutingError> {
        Ok(Self {
            client: http_client(PROVIDER)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full request URL for `points`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tour_routing::domain::GeoPoint;
    /// use tour_routing::providers::OsrmTripProvider;
    ///
    /// let provider = OsrmTripProvider::new("http://osrm.local/").unwrap();
    /// let url = provider.trip_url(&[GeoPoint::new(48.1, 11.5), GeoPoint::new(48.2, 11.6)]);
    /// assert_eq!(
    ///     url,
    ///     "http://osrm.local/trip/v1/driving/11.5,48.1;11.6,48.2?source=first&roundtrip=false"
    /// );
    /// ```
    pub fn trip_url(&self, points: &[GeoPoint]) -> String {
        format!(
            "{}/trip/v1/driving/{}?source=first&roundtrip=false",
            self.base_url,
            coordinate_list(points)
        )
    }
}

#[async_trait]
impl RoutingProvider for OsrmTripProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
        if points.len() <= 1 {
            return Ok(RouteResult::trivial(points));
        }

        let url = self.trip_url(points);
        debug!(%url, "Requesting OSRM trip");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!("OSRM request failed: {}", e);
                RoutingError::from_http(PROVIDER, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::from_http(PROVIDER, e))?;

        // OSRM reports errors as JSON with a non-"Ok" code, often with a 4xx status.
        let parsed: TripResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RoutingError::upstream(PROVIDER, format!("HTTP {}", status)));
            }
            Err(e) => {
                return Err(RoutingError::upstream(PROVIDER, format!("malformed response: {}", e)));
            }
        };

        let result = parse_trip(parsed, points.len())?;
        info!(
            points = points.len(),
            distance_km = result.total_distance_km,
            duration_min = result.total_duration_minutes,
            "OSRM trip computed"
        );
        Ok(result)
    }
}

/// Formats points as OSRM's `lng,lat;lng,lat` path segment.
fn coordinate_list(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lng, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// Converts a decoded trip response into a positional result.
fn parse_trip(response: TripResponse, submitted: usize) -> Result<RouteResult, RoutingError> {
    if response.code != "Ok" {
        let message = match response.message {
            Some(msg) => format!("{}: {}", response.code, msg),
            None => response.code,
        };
        return Err(RoutingError::upstream(PROVIDER, message));
    }

    let trip = response
        .trips
        .first()
        .ok_or_else(|| RoutingError::upstream(PROVIDER, "response contained no trips"))?;

    if response.waypoints.len() != submitted {
        return Err(RoutingError::upstream(
            PROVIDER,
            format!(
                "expected {} waypoints, got {}",
                submitted,
                response.waypoints.len()
            ),
        ));
    }

    let positions: Vec<usize> = response.waypoints.iter().map(|w| w.waypoint_index).collect();
    if !is_permutation(&positions, submitted) {
        return Err(RoutingError::upstream(
            PROVIDER,
            format!("waypoint_index values are not a permutation: {:?}", positions),
        ));
    }

    let mut ordered: Vec<(usize, IndexedPoint)> = response
        .waypoints
        .iter()
        .enumerate()
        .map(|(input_idx, w)| {
            let location = GeoPoint::new(w.location[1], w.location[0]);
            (w.waypoint_index, IndexedPoint::new(location, input_idx))
        })
        .collect();
    ordered.sort_by_key(|(position, _)| *position);

    Ok(RouteResult {
        total_distance_km: trip.distance / 1000.0,
        total_duration_minutes: trip.duration / 60.0,
        ordered_points: ordered.into_iter().map(|(_, p)| p).collect(),
    })
}

// ============================================================================
// OSRM Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct TripResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    trips: Vec<Trip>,
    #[serde(default)]
    waypoints: Vec<TripWaypoint>,
}

#[derive(Debug, Deserialize)]
struct Trip {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct TripWaypoint {
    /// `[lng, lat]` snapped to the road network.
    location: [f64; 2],
    /// Position of this input point within the trip.
    waypoint_index: usize,
}
