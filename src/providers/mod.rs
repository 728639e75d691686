//! Routing providers.
//!
//! A [`RoutingProvider`] turns a list of points into a visiting order. Every
//! implementation answers positionally: the result only carries indices into
//! the submitted slice, never caller identities.
//!
//! - [`HeuristicProvider`]: local nearest-neighbor tour, no network
//! - [`OsrmTripProvider`]: OSRM Trip service
//! - [`GoogleRoutesProvider`]: Google Routes with waypoint optimization
//! - [`FallbackProvider`]: explicit primary/secondary composite

mod fallback;
mod google;
mod heuristic;
mod osrm;

pub use fallback::FallbackProvider;
pub use google::{
    parse_duration_seconds, GoogleRoutesProvider, DEFAULT_GOOGLE_ROUTES_URL, DEFAULT_ROUTING_PREFERENCE,
};
pub use heuristic::{HeuristicProvider, HeuristicSettings};
pub use osrm::{OsrmTripProvider, DEFAULT_OSRM_BASE_URL};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ProviderKind, RoutingConfig};
use crate::domain::{GeoPoint, RouteResult};
use crate::error::RoutingError;

/// A backend that computes a visiting order for a set of points.
///
/// Position 0 of `points` is the fixed start of the tour. Implementations are
/// object-safe and thread-safe so one instance can be shared as
/// `Arc<dyn RoutingProvider>` across concurrent requests.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Computes a visiting order for `points`.
    ///
    /// The returned `ordered_points` reference every submitted index exactly
    /// once (closed-loop providers may repeat the start as a final entry).
    async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError>;
}

/// Builds the provider selected by `config`.
///
/// Selection happens once here; the optimizer only ever sees the trait object.
///
/// # Examples
///
/// ```
/// use tour_routing::config::RoutingConfig;
/// use tour_routing::providers::build_provider;
///
/// let provider = build_provider(&RoutingConfig::default()).unwrap();
/// assert_eq!(provider.name(), "heuristic");
/// ```
pub fn build_provider(config: &RoutingConfig) -> Result<Arc<dyn RoutingProvider>, RoutingError> {
    let heuristic = || -> Arc<dyn RoutingProvider> {
        Arc::new(HeuristicProvider::with_settings(config.heuristic))
    };

    let primary: Arc<dyn RoutingProvider> = match config.provider {
        ProviderKind::Heuristic => return Ok(heuristic()),
        ProviderKind::Osrm => Arc::new(
            OsrmTripProvider::new(&config.osrm_base_url)?.with_timeout(config.timeout),
        ),
        ProviderKind::Google => Arc::new(
            GoogleRoutesProvider::new(config.google_api_key.clone())?
                .with_endpoint(&config.google_routes_url)
                .with_routing_preference(&config.google_routing_preference)
                .with_timeout(config.timeout),
        ),
    };

    if config.fallback_to_heuristic {
        Ok(Arc::new(FallbackProvider::new(primary, heuristic())))
    } else {
        Ok(primary)
    }
}

/// Default timeout for remote routing requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the HTTP client for a remote provider.
///
/// The total request timeout is applied per request so it can be tuned after
/// construction.
pub(crate) fn http_client(provider: &'static str) -> Result<reqwest::Client, RoutingError> {
    reqwest::Client::builder()
        .connect_timeout(DEFAULT_TIMEOUT)
        .user_agent(concat!("tour-routing/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RoutingError::Configuration(format!("{} client: {}", provider, e)))
}

/// Checks that `indices` is a permutation of `0..len`.
pub(crate) fn is_permutation(indices: &[usize], len: usize) -> bool {
    if indices.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in indices {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
