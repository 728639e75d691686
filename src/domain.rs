//! Domain model for tour optimization.
//!
//! # Overview
//!
//! - [`GeoPoint`]: a latitude/longitude pair
//! - [`Stop`]: a caller-owned stop whose identity survives optimization
//! - [`IndexedPoint`] / [`RouteResult`]: the purely positional answer of a provider
//! - [`OptimizedRoute`]: the reconciled answer handed back to the caller
//!
//! All of these live for a single optimize call; nothing is persisted here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A geographic point in decimal degrees.
///
/// # Examples
///
/// ```
/// use tour_routing::domain::GeoPoint;
///
/// let marienplatz = GeoPoint::new(48.1372, 11.5755);
/// assert!(marienplatz.is_valid());
/// assert!(!GeoPoint::new(91.0, 0.0).is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90).
    pub lat: f64,
    /// Longitude in degrees (-180 to 180).
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both coordinates are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A stop supplied by the caller.
///
/// `id`, `name` and `address` are opaque to the optimization and are copied
/// through unchanged; only `location` takes part in the math.
///
/// # Examples
///
/// ```
/// use tour_routing::domain::{GeoPoint, Stop};
///
/// let stop = Stop::new("c-42", "Bakery Huber", GeoPoint::new(48.14, 11.56))
///     .with_address("Sendlinger Str. 1");
/// assert_eq!(stop.address.as_deref(), Some("Sendlinger Str. 1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub location: GeoPoint,
}

impl Stop {
    /// Creates a stop without an address.
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            location,
        }
    }

    /// Sets the postal address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A point in visiting order, tagged with its position in the submitted array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    /// Location as reported by the provider (may be snapped to a road).
    pub location: GeoPoint,
    /// Index into the array that was passed to the provider.
    pub original_index: usize,
}

impl IndexedPoint {
    /// Tags `location` with its index in the submitted array.
    pub fn new(location: GeoPoint, original_index: usize) -> Self {
        Self {
            location,
            original_index,
        }
    }
}

/// Positional result returned by every routing provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    /// Points in visiting order.
    pub ordered_points: Vec<IndexedPoint>,
}

impl RouteResult {
    /// Result for inputs too small to optimize: zero totals, identity order.
    ///
    /// # Examples
    ///
    /// ```
    /// use tour_routing::domain::{GeoPoint, RouteResult};
    ///
    /// let result = RouteResult::trivial(&[GeoPoint::new(48.0, 11.0)]);
    /// assert_eq!(result.total_distance_km, 0.0);
    /// assert_eq!(result.ordered_points[0].original_index, 0);
    /// ```
    pub fn trivial(points: &[GeoPoint]) -> Self {
        Self {
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
            ordered_points: points
                .iter()
                .enumerate()
                .map(|(i, &p)| IndexedPoint::new(p, i))
                .collect(),
        }
    }

    /// Original indices in visiting order.
    pub fn order(&self) -> Vec<usize> {
        self.ordered_points.iter().map(|p| p.original_index).collect()
    }
}

/// Reconciled tour handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    /// Caller stops in visiting order, synthetic start removed.
    pub stops: Vec<Stop>,
}

impl OptimizedRoute {
    /// Stop ids in visiting order.
    pub fn stop_ids(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.id.as_str()).collect()
    }
}
