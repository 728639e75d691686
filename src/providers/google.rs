//! Google Routes `computeRoutes` client with waypoint-order optimization.
//!
//! `points[0]` is sent as both origin and destination, so the route is a
//! closed loop; the remaining points are intermediates. The response's
//! `optimizedIntermediateWaypointIndex` indexes into the intermediates, which
//! is the full point array shifted by one.
//!
//! ## Environment Variables
//!
//! - `GOOGLE_MAPS_API_KEY`: required, checked before any request is sent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{http_client, is_permutation, RoutingProvider, DEFAULT_TIMEOUT};
use crate::domain::{GeoPoint, IndexedPoint, RouteResult};
use crate::error::RoutingError;

const PROVIDER: &str = "google";

/// Routes API v2 endpoint.
pub const DEFAULT_GOOGLE_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

/// Traffic-aware replanning is out of scope; plain road distances are enough.
pub const DEFAULT_ROUTING_PREFERENCE: &str = "TRAFFIC_UNAWARE";

const FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.optimizedIntermediateWaypointIndex";

/// Waypoint-optimizing provider backed by the Google Routes API.
///
/// ## Example
///
/// ```no_run
/// use tour_routing::providers::GoogleRoutesProvider;
///
/// let provider = GoogleRoutesProvider::new(std::env::var("GOOGLE_MAPS_API_KEY").ok())
///     .unwrap()
///     .with_routing_preference("TRAFFIC_AWARE");
/// ```
pub struct GoogleRoutesProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    routing_preference: String,
    timeout: Duration,
}

impl GoogleRoutesProvider {
    /// Creates a provider.
    ///
    /// A missing key is accepted here and reported as
    /// [`RoutingError::Configuration`] on the first route request, before any
    /// network traffic.
    pub fn new(api_key: Option<String>) -> Result<Self, RoutingError> {
        Ok(Self {
            client: http_client(PROVIDER)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: DEFAULT_GOOGLE_ROUTES_URL.to_string(),
            routing_preference: DEFAULT_ROUTING_PREFERENCE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the `computeRoutes` endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_routing_preference(mut self, preference: &str) -> Self {
        self.routing_preference = preference.to_string();
        self
    }

    /// Sets the total request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn build_request<'a>(&'a self, points: &[GeoPoint]) -> ComputeRoutesRequest<'a> {
        let origin = Waypoint::from(points[0]);
        ComputeRoutesRequest {
            origin,
            destination: origin,
            intermediates: points[1..].iter().map(|&p| Waypoint::from(p)).collect(),
            travel_mode: "DRIVE",
            optimize_waypoint_order: true,
            routing_preference: &self.routing_preference,
        }
    }
}

#[async_trait]
impl RoutingProvider for GoogleRoutesProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RoutingError::Configuration("GOOGLE_MAPS_API_KEY is not set".to_string())
        })?;

        if points.len() <= 1 {
            return Ok(RouteResult::trivial(points));
        }

        let request = self.build_request(points);
        debug!(
            endpoint = %self.endpoint,
            intermediates = request.intermediates.len(),
            "Requesting Google route"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Goog-Api-Key", api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Google Routes request failed: {}", e);
                RoutingError::from_http(PROVIDER, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(RoutingError::upstream(
                PROVIDER,
                format!("HTTP {}: {}", status, detail),
            ));
        }

        let parsed: ComputeRoutesResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::upstream(PROVIDER, format!("malformed response: {}", e)))?;

        let result = parse_routes(parsed, points)?;
        info!(
            points = points.len(),
            distance_km = result.total_distance_km,
            duration_min = result.total_duration_minutes,
            "Google route computed"
        );
        Ok(result)
    }
}

/// Parses a protobuf-JSON duration such as `"300s"` or `"12.5s"` into seconds.
///
/// # Examples
///
/// ```
/// use tour_routing::providers::parse_duration_seconds;
///
/// assert_eq!(parse_duration_seconds("300s"), Some(300.0));
/// assert_eq!(parse_duration_seconds("0.5s"), Some(0.5));
/// assert_eq!(parse_duration_seconds("5m"), None);
/// ```
pub fn parse_duration_seconds(duration: &str) -> Option<f64> {
    let seconds: f64 = duration.trim().strip_suffix('s')?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Converts a decoded response into a closed-loop positional result.
fn parse_routes(response: ComputeRoutesResponse, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::upstream(PROVIDER, "response contained no routes"))?;

    let duration_s = match route.duration.as_deref() {
        Some(d) => parse_duration_seconds(d)
            .ok_or_else(|| RoutingError::upstream(PROVIDER, format!("unparseable duration {:?}", d)))?,
        None => 0.0,
    };

    let intermediates = points.len() - 1;
    // Absent when the service kept the submitted order.
    let order = route
        .optimized_intermediate_waypoint_index
        .unwrap_or_else(|| (0..intermediates).collect());
    if !is_permutation(&order, intermediates) {
        return Err(RoutingError::upstream(
            PROVIDER,
            format!("optimizedIntermediateWaypointIndex is not a permutation: {:?}", order),
        ));
    }

    let origin = IndexedPoint::new(points[0], 0);
    let mut ordered = Vec::with_capacity(points.len() + 1);
    ordered.push(origin);
    ordered.extend(order.into_iter().map(|k| IndexedPoint::new(points[k + 1], k + 1)));
    ordered.push(origin);

    Ok(RouteResult {
        total_distance_km: route.distance_meters / 1000.0,
        total_duration_minutes: duration_s / 60.0,
        ordered_points: ordered,
    })
}

// ============================================================================
// Routes API Structures
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest<'a> {
    origin: Waypoint,
    destination: Waypoint,
    intermediates: Vec<Waypoint>,
    travel_mode: &'static str,
    optimize_waypoint_order: bool,
    routing_preference: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Waypoint {
    location: WaypointLocation,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct WaypointLocation {
    lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl From<GeoPoint> for Waypoint {
    fn from(p: GeoPoint) -> Self {
        Self {
            location: WaypointLocation {
                lat_lng: LatLng {
                    latitude: p.lat,
                    longitude: p.lng,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Route {
    /// Omitted by the API when zero.
    #[serde(default)]
    distance_meters: f64,
    duration: Option<String>,
    optimized_intermediate_waypoint_index: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn three_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(48.0, 11.0),
            GeoPoint::new(48.1, 11.1),
            GeoPoint::new(48.2, 11.2),
        ]
    }

    fn decode(value: serde_json::Value) -> ComputeRoutesResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reconciles_intermediate_offset() {
        let response = decode(json!({
            "routes": [{
                "distanceMeters": 10000,
                "duration": "300s",
                "optimizedIntermediateWaypointIndex": [1, 0]
            }]
        }));
        let result = parse_routes(response, &three_points()).unwrap();
        assert_eq!(result.order(), vec![0, 2, 1, 0]);
        assert_eq!(result.total_distance_km, 10.0);
        assert_eq!(result.total_duration_minutes, 5.0);
        assert_eq!(result.ordered_points[1].location, GeoPoint::new(48.2, 11.2));
    }

    #[test]
    fn test_missing_order_means_identity() {
        let response = decode(json!({"routes": [{"distanceMeters": 5, "duration": "60s"}]}));
        let result = parse_routes(response, &three_points()).unwrap();
        assert_eq!(result.order(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_empty_routes_is_upstream_error() {
        let response = decode(json!({}));
        assert!(parse_routes(response, &three_points()).unwrap_err().is_upstream());
    }

    #[test]
    fn test_bad_order_is_upstream_error() {
        let response = decode(json!({
            "routes": [{"duration": "1s", "optimizedIntermediateWaypointIndex": [0, 2]}]
        }));
        assert!(parse_routes(response, &three_points()).unwrap_err().is_upstream());
    }

    #[test]
    fn test_bad_duration_is_upstream_error() {
        let response = decode(json!({"routes": [{"duration": "soon"}]}));
        assert!(parse_routes(response, &three_points()).unwrap_err().is_upstream());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_seconds("600s").map(|s| s / 60.0), Some(10.0));
        assert_eq!(parse_duration_seconds(" 42s "), Some(42.0));
        assert_eq!(parse_duration_seconds("-1s"), None);
        assert_eq!(parse_duration_seconds("s"), None);
        assert_eq!(parse_duration_seconds(""), None);
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GoogleRoutesProvider::new(Some("key".into())).unwrap();
        let body = serde_json::to_value(provider.build_request(&three_points())).unwrap();
        assert_eq!(body["origin"], body["destination"]);
        assert_eq!(body["origin"]["location"]["latLng"]["latitude"], json!(48.0));
        assert_eq!(body["intermediates"].as_array().unwrap().len(), 2);
        assert_eq!(body["travelMode"], json!("DRIVE"));
        assert_eq!(body["optimizeWaypointOrder"], json!(true));
        assert_eq!(body["routingPreference"], json!("TRAFFIC_UNAWARE"));
    }

    #[tokio::test]
    async fn test_blank_key_is_configuration_error() {
        let provider = GoogleRoutesProvider::new(Some("  ".into())).unwrap();
        let err = provider.calculate_route(&three_points()).await.unwrap_err();
        assert!(matches!(err, RoutingError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_single_point_with_key_is_trivial() {
        let provider = GoogleRoutesProvider::new(Some("key".into()))
            .unwrap()
            .with_endpoint("http://127.0.0.1:1/unused");
        let result = provider.calculate_route(&[GeoPoint::new(1.0, 2.0)]).await.unwrap();
        assert_eq!(result.order(), vec![0]);
    }
}
