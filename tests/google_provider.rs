//! Integration tests for [`GoogleRoutesProvider`] against a mock Routes API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use tour_routing::domain::GeoPoint;
use tour_routing::error::RoutingError;
use tour_routing::providers::{GoogleRoutesProvider, RoutingProvider};

const ROUTES_PATH: &str = "/directions/v2:computeRoutes";

const FIELD_MASK: &str =
    "routes.duration,routes.distanceMeters,routes.optimizedIntermediateWaypointIndex";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Matches the raw header value. `wiremock::matchers::header` splits values
/// on commas, which breaks on a field mask.
struct RawHeader(&'static str, &'static str);

impl Match for RawHeader {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get(self.0)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == self.1)
    }
}

fn points() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(48.0, 11.0),
        GeoPoint::new(48.1, 11.1),
        GeoPoint::new(48.2, 11.2),
    ]
}

fn provider_for(server: &MockServer, key: Option<&str>) -> GoogleRoutesProvider {
    GoogleRoutesProvider::new(key.map(str::to_string))
        .unwrap()
        .with_endpoint(&format!("{}{}", server.uri(), ROUTES_PATH))
}

fn routes_body(order: &[usize]) -> serde_json::Value {
    json!({
        "routes": [{
            "distanceMeters": 12500,
            "duration": "300s",
            "optimizedIntermediateWaypointIndex": order
        }]
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_carries_key_field_mask_and_closed_loop_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROUTES_PATH))
        .and(header("X-Goog-Api-Key", "test-key"))
        .and(RawHeader("x-goog-fieldmask", FIELD_MASK))
        .and(body_partial_json(json!({
            "origin": {"location": {"latLng": {"latitude": 48.0, "longitude": 11.0}}},
            "destination": {"location": {"latLng": {"latitude": 48.0, "longitude": 11.0}}},
            "travelMode": "DRIVE",
            "optimizeWaypointOrder": true,
            "routingPreference": "TRAFFIC_UNAWARE"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(routes_body(&[0, 1])))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider_for(&server, Some("test-key"))
        .calculate_route(&points())
        .await
        .unwrap();
    assert_eq!(result.order(), vec![0, 1, 2, 0]);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(
        received[0].headers.get("x-goog-fieldmask").unwrap(),
        FIELD_MASK
    );
}

#[tokio::test]
async fn optimized_order_is_shifted_past_origin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROUTES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(routes_body(&[1, 0])))
        .mount(&server)
        .await;

    let result = provider_for(&server, Some("test-key"))
        .calculate_route(&points())
        .await
        .unwrap();
    assert_eq!(result.order(), vec![0, 2, 1, 0]);
    assert_eq!(result.total_distance_km, 12.5);
    assert_eq!(result.total_duration_minutes, 5.0);
}

#[tokio::test]
async fn missing_key_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(routes_body(&[0, 1])))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider_for(&server, None)
        .calculate_route(&points())
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::Configuration(_)), "{:?}", err);

    server.verify().await;
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROUTES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&server)
        .await;

    let err = provider_for(&server, Some("bad-key"))
        .calculate_route(&points())
        .await
        .unwrap_err();
    match err {
        RoutingError::Upstream { provider, message } => {
            assert_eq!(provider, "google");
            assert!(message.contains("403"), "{}", message);
            assert!(message.contains("API key not valid"), "{}", message);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_routes_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROUTES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = provider_for(&server, Some("test-key"))
        .calculate_route(&points())
        .await
        .unwrap_err();
    assert!(err.is_upstream(), "{:?}", err);
}
