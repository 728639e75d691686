//! Local nearest-neighbor tour construction.

use async_trait::async_trait;

use super::RoutingProvider;
use crate::domain::{GeoPoint, IndexedPoint, RouteResult};
use crate::error::RoutingError;
use crate::geometry::distance_km;

/// Average driving speed assumed by the duration estimate.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Fixed dwell time per stop.
pub const DEFAULT_DWELL_MINUTES: f64 = 15.0;

/// Tuning for the duration estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicSettings {
    /// Average travel speed in km/h.
    pub speed_kmh: f64,
    /// Minutes spent at each stop.
    pub dwell_minutes: f64,
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            dwell_minutes: DEFAULT_DWELL_MINUTES,
        }
    }
}

/// Greedy nearest-neighbor provider.
///
/// Starts at `points[0]` and always moves to the closest unvisited point.
/// Ties go to the point found first in scan order, so the result is
/// deterministic for a given input order.
///
/// # Examples
///
/// ```
/// use tour_routing::domain::GeoPoint;
/// use tour_routing::providers::HeuristicProvider;
///
/// let a = GeoPoint::new(48.1372, 11.5755);
/// let far = GeoPoint::new(48.2000, 11.7000);
/// let near = GeoPoint::new(48.1402, 11.5595);
///
/// let result = HeuristicProvider::new().solve(&[a, far, near]);
/// assert_eq!(result.order(), vec![0, 2, 1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeuristicProvider {
    settings: HeuristicSettings,
}

impl HeuristicProvider {
    /// Creates a provider with the default 40 km/h, 15 min dwell estimate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with a custom speed and dwell estimate.
    pub fn with_settings(settings: HeuristicSettings) -> Self {
        Self { settings }
    }

    /// Runs the heuristic synchronously. Never fails.
    pub fn solve(&self, points: &[GeoPoint]) -> RouteResult {
        if points.len() <= 1 {
            return RouteResult::trivial(points);
        }

        let n = points.len();
        let mut visited = vec![false; n];
        let mut ordered = Vec::with_capacity(n);
        let mut total_km = 0.0;

        let mut current = 0;
        visited[0] = true;
        ordered.push(IndexedPoint::new(points[0], 0));

        for _ in 1..n {
            let mut best: Option<(usize, f64)> = None;
            for (j, &candidate) in points.iter().enumerate() {
                if visited[j] {
                    continue;
                }
                let d = distance_km(points[current], candidate);
                // strict < keeps the first candidate on ties
                if best.map_or(true, |(_, best_d)| d < best_d) {
                    best = Some((j, d));
                }
            }

            let Some((next, d)) = best else {
                break;
            };
            visited[next] = true;
            total_km += d;
            ordered.push(IndexedPoint::new(points[next], next));
            current = next;
        }

        let travel_minutes = total_km / self.settings.speed_kmh * 60.0;
        let dwell_minutes = n as f64 * self.settings.dwell_minutes;

        RouteResult {
            total_distance_km: round_to_tenth(total_km),
            total_duration_minutes: (travel_minutes + dwell_minutes).round(),
            ordered_points: ordered,
        }
    }
}

#[async_trait]
impl RoutingProvider for HeuristicProvider {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
        Ok(self.solve(points))
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
