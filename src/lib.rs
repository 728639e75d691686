//! Tour Routing
//!
//! Orders a set of stops into a short visiting sequence using a pluggable
//! routing backend, then maps the backend's answer back onto the caller's
//! stops.
//!
//! # Domain Model
//!
//! - [`GeoPoint`](domain::GeoPoint): Latitude/longitude pair
//! - [`Stop`](domain::Stop): Caller-owned stop with identity and address
//! - [`RouteResult`](domain::RouteResult): Positional provider answer
//! - [`OptimizedRoute`](domain::OptimizedRoute): Stops in visiting order
//!
//! # Providers
//!
//! - **Heuristic**: Nearest-neighbor over haversine distances, no network
//! - **OSRM**: Trip service (`/trip/v1/driving`)
//! - **Google**: Routes API with waypoint optimization
//! - **Fallback**: Remote provider backed by the heuristic on upstream failure

pub mod api;
pub mod config;
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod optimizer;
pub mod providers;
