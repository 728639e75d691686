//! Tour optimization: normalizes the caller's stops, runs the provider, and
//! maps the provider's positional answer back onto the caller's stops.
//!
//! With a start location the provider sees `[start, stop_0, stop_1, ...]`;
//! index 0 is then synthetic and every other index is shifted by one. Without
//! a start the first stop anchors the tour.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::domain::{GeoPoint, OptimizedRoute, RouteResult, Stop};
use crate::error::RoutingError;
use crate::providers::RoutingProvider;

/// Optimizes stops with an injected provider.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tour_routing::domain::{GeoPoint, Stop};
/// use tour_routing::optimizer::RouteOptimizer;
/// use tour_routing::providers::HeuristicProvider;
///
/// # #[tokio::main]
/// # async fn main() {
/// let optimizer = RouteOptimizer::new(Arc::new(HeuristicProvider::new()));
/// let stops = vec![
///     Stop::new("far", "Far", GeoPoint::new(48.30, 11.90)),
///     Stop::new("near", "Near", GeoPoint::new(48.14, 11.56)),
/// ];
/// let depot = GeoPoint::new(48.1372, 11.5755);
///
/// let route = optimizer.optimize(&stops, Some(depot)).await.unwrap();
/// assert_eq!(route.stop_ids(), vec!["near", "far"]);
/// # }
/// ```
#[derive(Clone)]
pub struct RouteOptimizer {
    provider: Arc<dyn RoutingProvider>,
}

impl RouteOptimizer {
    pub fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        Self { provider }
    }

    /// Name of the injected provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Computes a visiting order for `stops`, optionally anchored at `start`.
    pub async fn optimize(
        &self,
        stops: &[Stop],
        start: Option<GeoPoint>,
    ) -> Result<OptimizedRoute, RoutingError> {
        optimize(stops, start, self.provider.as_ref()).await
    }

    /// Like [`optimize`](Self::optimize), but gives up as soon as `cancel`
    /// fires. The in-flight provider call is dropped, which aborts any
    /// outstanding HTTP request.
    pub async fn optimize_with_cancel(
        &self,
        stops: &[Stop],
        start: Option<GeoPoint>,
        cancel: &CancellationToken,
    ) -> Result<OptimizedRoute, RoutingError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(provider = self.provider.name(), "Route optimization cancelled");
                Err(RoutingError::Cancelled)
            }
            result = self.optimize(stops, start) => result,
        }
    }
}

/// Computes a visiting order for `stops` using `provider`.
///
/// Fails with [`RoutingError::Validation`] for an empty stop list or invalid
/// coordinates before the provider is called. Provider errors are returned
/// unchanged.
pub async fn optimize(
    stops: &[Stop],
    start: Option<GeoPoint>,
    provider: &dyn RoutingProvider,
) -> Result<OptimizedRoute, RoutingError> {
    validate(stops, start)?;

    let points = build_points(stops, start);
    let span = info_span!(
        "optimize",
        provider = provider.name(),
        stops = stops.len(),
        has_start = start.is_some()
    );

    async move {
        let started = Instant::now();
        let result = provider.calculate_route(&points).await?;
        let route = reconcile(stops, start.is_some(), result, provider.name())?;

        info!(
            distance_km = route.total_distance_km,
            duration_min = route.total_duration_minutes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tour optimized"
        );
        Ok(route)
    }
    .instrument(span)
    .await
}

fn validate(stops: &[Stop], start: Option<GeoPoint>) -> Result<(), RoutingError> {
    if stops.is_empty() {
        return Err(RoutingError::Validation(
            "at least one stop is required".to_string(),
        ));
    }
    if let Some(start) = start {
        if !start.is_valid() {
            return Err(RoutingError::Validation(format!(
                "start location ({}, {}) is out of range",
                start.lat, start.lng
            )));
        }
    }
    if let Some(stop) = stops.iter().find(|s| !s.location.is_valid()) {
        return Err(RoutingError::Validation(format!(
            "stop {:?} has out-of-range coordinates ({}, {})",
            stop.id, stop.location.lat, stop.location.lng
        )));
    }
    Ok(())
}

/// Points submitted to the provider: optional start, then every stop.
fn build_points(stops: &[Stop], start: Option<GeoPoint>) -> Vec<GeoPoint> {
    start
        .into_iter()
        .chain(stops.iter().map(|s| s.location))
        .collect()
}

/// Maps provider indices back to caller stops.
///
/// Every submitted index must appear exactly once. A final entry repeating the
/// first index is the closing leg of a round trip and is dropped.
fn reconcile(
    stops: &[Stop],
    has_start: bool,
    result: RouteResult,
    provider: &'static str,
) -> Result<OptimizedRoute, RoutingError> {
    let RouteResult {
        total_distance_km,
        total_duration_minutes,
        ordered_points,
    } = result;

    for (label, value) in [("distance", total_distance_km), ("duration", total_duration_minutes)] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(RoutingError::upstream(provider, format!("invalid total {}: {}", label, value)));
        }
    }

    let submitted = stops.len() + usize::from(has_start);
    let mut entries = ordered_points.as_slice();
    if let [first, .., last] = entries {
        if first.original_index == last.original_index {
            entries = &entries[..entries.len() - 1];
        }
    }

    let mut seen = vec![false; submitted];
    let mut ordered = Vec::with_capacity(stops.len());
    for point in entries {
        let idx = point.original_index;
        let Some(slot) = seen.get_mut(idx) else {
            return Err(RoutingError::upstream(
                provider,
                format!("index {} out of range for {} points", idx, submitted),
            ));
        };
        if *slot {
            return Err(RoutingError::upstream(provider, format!("index {} returned twice", idx)));
        }
        *slot = true;

        let stop_idx = if has_start {
            match idx.checked_sub(1) {
                Some(i) => i,
                None => continue, // synthetic start
            }
        } else {
            idx
        };

        let caller = &stops[stop_idx];
        ordered.push(Stop {
            location: point.location,
            ..caller.clone()
        });
    }

    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(RoutingError::upstream(provider, format!("index {} missing from route", missing)));
    }

    Ok(OptimizedRoute {
        total_distance_km,
        total_duration_minutes,
        stops: ordered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexedPoint;
    use crate::providers::HeuristicProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns a canned order and records what it was asked.
    struct Scripted {
        order: Vec<usize>,
        distance_km: f64,
        calls: AtomicUsize,
        last_points: Mutex<Vec<GeoPoint>>,
    }

    impl Scripted {
        fn new(order: Vec<usize>) -> Self {
            Self {
                order,
                distance_km: 3.0,
                calls: AtomicUsize::new(0),
                last_points: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RoutingProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_points.lock().unwrap() = points.to_vec();
            Ok(RouteResult {
                total_distance_km: self.distance_km,
                total_duration_minutes: 7.0,
                ordered_points: self
                    .order
                    .iter()
                    .map(|&i| {
                        let location = points.get(i).copied().unwrap_or(GeoPoint::new(0.0, 0.0));
                        IndexedPoint::new(location, i)
                    })
                    .collect(),
            })
        }
    }

    /// Never answers.
    struct Hanging;

    #[async_trait]
    impl RoutingProvider for Hanging {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn calculate_route(&self, _points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
            std::future::pending().await
        }
    }

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new("a", "Alpha", GeoPoint::new(48.10, 11.50)).with_address("A-Str. 1"),
            Stop::new("b", "Bravo", GeoPoint::new(48.20, 11.60)),
            Stop::new("c", "Charlie", GeoPoint::new(48.15, 11.55)),
        ]
    }

    #[tokio::test]
    async fn test_empty_stops_is_validation_error_without_provider_call() {
        let provider = Scripted::new(vec![]);
        let err = optimize(&[], None, &provider).await.unwrap_err();
        assert!(matches!(err, RoutingError::Validation(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_coordinates_rejected() {
        let provider = Scripted::new(vec![0]);
        let bad = vec![Stop::new("x", "X", GeoPoint::new(123.0, 0.0))];
        assert!(matches!(
            optimize(&bad, None, &provider).await.unwrap_err(),
            RoutingError::Validation(_)
        ));
        let err = optimize(&stops(), Some(GeoPoint::new(0.0, f64::NAN)), &provider)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Validation(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_is_injected_and_removed() {
        let provider = Scripted::new(vec![0, 3, 1, 2]);
        let start = GeoPoint::new(48.0, 11.0);
        let route = optimize(&stops(), Some(start), &provider).await.unwrap();

        let submitted = provider.last_points.lock().unwrap().clone();
        assert_eq!(submitted.len(), 4);
        assert_eq!(submitted[0], start);
        assert_eq!(route.stops.len(), 3);
        assert_eq!(route.stop_ids(), vec!["c", "a", "b"]);
        assert!(route.stops.iter().all(|s| s.location != start));
    }

    #[tokio::test]
    async fn test_without_start_first_stop_anchors() {
        let provider = Scripted::new(vec![0, 2, 1]);
        let route = optimize(&stops(), None, &provider).await.unwrap();
        assert_eq!(provider.last_points.lock().unwrap().len(), 3);
        assert_eq!(route.stop_ids(), vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_identity_fields_carried_and_location_from_provider() {
        struct Snapping;

        #[async_trait]
        impl RoutingProvider for Snapping {
            fn name(&self) -> &'static str {
                "snapping"
            }

            async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
                Ok(RouteResult {
                    total_distance_km: 0.0,
                    total_duration_minutes: 0.0,
                    ordered_points: points
                        .iter()
                        .enumerate()
                        .map(|(i, p)| IndexedPoint::new(GeoPoint::new(p.lat + 0.001, p.lng), i))
                        .collect(),
                })
            }
        }

        let route = optimize(&stops(), None, &Snapping).await.unwrap();
        assert_eq!(route.stops[0].id, "a");
        assert_eq!(route.stops[0].name, "Alpha");
        assert_eq!(route.stops[0].address.as_deref(), Some("A-Str. 1"));
        let snapped = route.stops[0].location;
        assert!((snapped.lat - 48.101).abs() < 1e-9);
        assert_eq!(snapped.lng, 11.50);
    }

    #[tokio::test]
    async fn test_closed_loop_repeat_is_dropped() {
        // Closed loop without start: the anchor stop must appear once.
        let provider = Scripted::new(vec![0, 2, 1, 0]);
        let route = optimize(&stops(), None, &provider).await.unwrap();
        assert_eq!(route.stop_ids(), vec!["a", "c", "b"]);

        let provider = Scripted::new(vec![0, 2, 3, 1, 0]);
        let route = optimize(&stops(), Some(GeoPoint::new(48.0, 11.0)), &provider)
            .await
            .unwrap();
        assert_eq!(route.stop_ids(), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_broken_permutations_are_upstream_errors() {
        for order in [vec![0, 1], vec![0, 1, 1], vec![0, 1, 2, 1], vec![0, 1, 5]] {
            let provider = Scripted::new(order.clone());
            let err = optimize(&stops(), None, &provider).await.unwrap_err();
            assert!(err.is_upstream(), "order {:?}", order);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_upstream_error() {
        let provider = Scripted::new(vec![0, 1, 5]);
        match optimize(&stops(), None, &provider).await.unwrap_err() {
            RoutingError::Upstream { provider, message } => {
                assert_eq!(provider, "scripted");
                assert!(message.contains("out of range"), "{}", message);
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_negative_totals_are_upstream_errors() {
        let mut provider = Scripted::new(vec![0, 1, 2]);
        provider.distance_km = -1.0;
        assert!(optimize(&stops(), None, &provider).await.unwrap_err().is_upstream());
    }

    #[tokio::test]
    async fn test_single_stop_with_start() {
        let optimizer = RouteOptimizer::new(Arc::new(HeuristicProvider::new()));
        let only = vec![Stop::new("solo", "Solo", GeoPoint::new(48.2, 11.6))];
        let route = optimizer
            .optimize(&only, Some(GeoPoint::new(48.1, 11.5)))
            .await
            .unwrap();
        assert_eq!(route.stop_ids(), vec!["solo"]);
        assert!(route.total_distance_km > 0.0);
    }

    #[tokio::test]
    async fn test_heuristic_end_to_end_with_start() {
        let optimizer = RouteOptimizer::new(Arc::new(HeuristicProvider::new()));
        let route = optimizer
            .optimize(&stops(), Some(GeoPoint::new(48.09, 11.49)))
            .await
            .unwrap();
        assert_eq!(route.stop_ids(), vec!["a", "c", "b"]);
        assert!(route.total_duration_minutes >= 0.0);
    }

    #[tokio::test]
    async fn test_cancellation() {
        let optimizer = RouteOptimizer::new(Arc::new(Hanging));
        let token = CancellationToken::new();
        token.cancel();
        let err = optimizer
            .optimize_with_cancel(&stops(), None, &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Cancelled));
    }

    #[tokio::test]
    async fn test_uncancelled_token_returns_result() {
        let optimizer = RouteOptimizer::new(Arc::new(HeuristicProvider::new()));
        let token = CancellationToken::new();
        let route = optimizer
            .optimize_with_cancel(&stops(), None, &token)
            .await
            .unwrap();
        assert_eq!(route.stops.len(), 3);
    }
}
