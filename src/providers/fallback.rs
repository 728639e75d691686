//! Composite provider that retries once on a secondary backend.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use super::RoutingProvider;
use crate::domain::{GeoPoint, RouteResult};
use crate::error::RoutingError;

/// Delegates to `primary`, and to `fallback` only when `primary` reports an
/// upstream failure.
///
/// Validation, configuration and cancellation errors are returned as-is: a
/// second backend would not fix them.
pub struct FallbackProvider {
    primary: Arc<dyn RoutingProvider>,
    fallback: Arc<dyn RoutingProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Arc<dyn RoutingProvider>, fallback: Arc<dyn RoutingProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl RoutingProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn calculate_route(&self, points: &[GeoPoint]) -> Result<RouteResult, RoutingError> {
        match self.primary.calculate_route(points).await {
            Err(e) if e.is_upstream() => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "Primary routing failed, falling back: {}",
                    e
                );
                self.fallback.calculate_route(points).await
            }
            other => other,
        }
    }
}
