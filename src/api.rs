//! REST API for tour optimization.
//!
//! Provides endpoints for:
//! - Health and service info
//! - Demo tours
//! - Tour optimization (`POST /tours/optimize`)
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, warn, Instrument};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::console;
use crate::demo_data::{available_datasets, generate_by_name, DemoTour};
use crate::domain::{GeoPoint, OptimizedRoute, Stop};
use crate::error::RoutingError;
use crate::geometry::BoundingBox;
use crate::optimizer::RouteOptimizer;

/// Padding around the tour when reporting map bounds.
const BOUNDS_PADDING: f64 = 0.05;

/// Application state shared across handlers.
pub struct AppState {
    pub optimizer: RouteOptimizer,
    /// Fires on server shutdown; in-flight optimizations give up.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(optimizer: RouteOptimizer) -> Self {
        Self {
            optimizer,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Creates the API router with CORS, request tracing and Swagger UI enabled.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{name}", get(get_demo_data))
        // Tours
        .route("/tours/optimize", post(optimize_tour))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// DTOs
// ============================================================================

/// Stop as exchanged over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StopDto {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl StopDto {
    pub fn to_domain(&self) -> Stop {
        Stop {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
            location: GeoPoint::new(self.lat, self.lng),
        }
    }

    pub fn from_domain(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            address: stop.address.clone(),
            lat: stop.location.lat,
            lng: stop.location.lng,
        }
    }
}

/// Body of `POST /tours/optimize`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    /// Stops in any order.
    pub stops: Vec<StopDto>,
    /// Where the tour begins. Without it the first stop anchors the tour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<GeoPoint>,
}

impl From<DemoTour> for OptimizeRequest {
    fn from(tour: DemoTour) -> Self {
        Self {
            stops: tour.stops.iter().map(StopDto::from_domain).collect(),
            start: tour.start,
        }
    }
}

/// Optimized tour.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    /// Provider that produced the order.
    pub provider: String,
    /// Stops in visiting order.
    pub stops: Vec<StopDto>,
    /// `[lat, lng]` of the padded map bounds.
    pub south_west_corner: Vec<f64>,
    pub north_east_corner: Vec<f64>,
}

impl OptimizeResponse {
    fn from_route(route: &OptimizedRoute, provider: &str, start: Option<GeoPoint>) -> Self {
        let points: Vec<GeoPoint> = start
            .into_iter()
            .chain(route.stops.iter().map(|s| s.location))
            .collect();
        let (south_west_corner, north_east_corner) = match BoundingBox::around(&points) {
            Some(bbox) => {
                let bbox = bbox.expand(BOUNDS_PADDING);
                (bbox.south_west().to_vec(), bbox.north_east().to_vec())
            }
            None => (Vec::new(), Vec::new()),
        };

        Self {
            total_distance_km: route.total_distance_km,
            total_duration_minutes: route.total_duration_minutes,
            provider: provider.to_string(),
            stops: route.stops.iter().map(StopDto::from_domain).collect(),
            south_west_corner,
            north_east_corner,
        }
    }
}

/// Error body for every failed request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// `VALIDATION`, `CONFIGURATION`, `UPSTREAM` or `CANCELLED`.
    pub error: String,
    pub message: String,
}

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        let status = match &self {
            RoutingError::Validation(_) => StatusCode::BAD_REQUEST,
            RoutingError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RoutingError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RoutingError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    /// Active routing provider.
    pub provider: &'static str,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Tour Routing",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.optimizer.provider_name(),
    })
}

// ============================================================================
// Demo Data
// ============================================================================

/// GET /demo-data - List available demo tours.
#[utoipa::path(
    get,
    path = "/demo-data",
    responses((status = 200, description = "List of demo tour names", body = Vec<String>))
)]
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(available_datasets().to_vec())
}

/// GET /demo-data/{name} - Get a demo tour as an optimize request.
#[utoipa::path(
    get,
    path = "/demo-data/{name}",
    params(("name" = String, Path, description = "Demo tour name")),
    responses(
        (status = 200, description = "Demo tour retrieved", body = OptimizeRequest),
        (status = 404, description = "Tour not found")
    )
)]
async fn get_demo_data(Path(name): Path<String>) -> Result<Json<OptimizeRequest>, StatusCode> {
    match generate_by_name(&name) {
        Some(tour) => Ok(Json(tour.into())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Tours
// ============================================================================

/// POST /tours/optimize - Compute a visiting order for the given stops.
#[utoipa::path(
    post,
    path = "/tours/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Tour optimized", body = OptimizeResponse),
        (status = 400, description = "Malformed body or invalid stops", body = ErrorResponse),
        (status = 500, description = "Provider misconfigured", body = ErrorResponse),
        (status = 502, description = "Routing backend failed", body = ErrorResponse),
        (status = 503, description = "Server shutting down", body = ErrorResponse)
    )
)]
async fn optimize_tour(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<OptimizeResponse>, RoutingError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected tour body: {}", rejection.body_text());
        RoutingError::Validation(rejection.body_text())
    })?;
    let request_id = Uuid::new_v4();
    let span = info_span!("tour", %request_id, stops = request.stops.len());

    async move {
        let stops: Vec<Stop> = request.stops.iter().map(StopDto::to_domain).collect();
        let provider = state.optimizer.provider_name();
        let started = Instant::now();

        let route = state
            .optimizer
            .optimize_with_cancel(&stops, request.start, &state.shutdown)
            .await
            .inspect_err(|e| match e {
                RoutingError::Validation(msg) => warn!("Rejected tour: {}", msg),
                RoutingError::Cancelled => warn!("Tour optimization cancelled by shutdown"),
                other => error!("Tour optimization failed: {}", other),
            })?;

        console::print_route_summary(provider, &route, started.elapsed());
        Ok(Json(OptimizeResponse::from_route(&route, provider, request.start)))
    }
    .instrument(span)
    .await
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(health, info, list_demo_data, get_demo_data, optimize_tour),
    components(schemas(
        HealthResponse,
        InfoResponse,
        GeoPoint,
        StopDto,
        OptimizeRequest,
        OptimizeResponse,
        ErrorResponse,
    ))
)]
struct ApiDoc;
