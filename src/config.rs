//! Runtime configuration read from environment variables.
//!
//! ## Environment Variables
//!
//! - `ROUTING_PROVIDER`: `heuristic` (default), `osrm` or `google`
//! - `ROUTING_FALLBACK`: set to `heuristic` to fall back on upstream failures
//! - `ROUTING_TIMEOUT_SECS`: remote request timeout (default: 5)
//! - `OSRM_BASE_URL`: OSRM server (default: public demo server)
//! - `GOOGLE_ROUTES_URL`: Routes API endpoint override
//! - `GOOGLE_MAPS_API_KEY`: required by the `google` provider
//! - `GOOGLE_ROUTING_PREFERENCE`: default `TRAFFIC_UNAWARE`
//! - `HEURISTIC_SPEED_KMH` / `HEURISTIC_DWELL_MINUTES`: duration estimate
//! - `BIND_ADDR`: server address (default: 0.0.0.0:7860)

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RoutingError;
use crate::providers::{
    HeuristicSettings, DEFAULT_GOOGLE_ROUTES_URL, DEFAULT_OSRM_BASE_URL, DEFAULT_ROUTING_PREFERENCE,
    DEFAULT_TIMEOUT,
};

/// Which backend computes the visiting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Heuristic,
    Osrm,
    Google,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Heuristic => "heuristic",
            ProviderKind::Osrm => "osrm",
            ProviderKind::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = RoutingError;

    /// ```
    /// use tour_routing::config::ProviderKind;
    ///
    /// assert_eq!("OSRM".parse::<ProviderKind>().unwrap(), ProviderKind::Osrm);
    /// assert!("here".parse::<ProviderKind>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "local" => Ok(ProviderKind::Heuristic),
            "osrm" | "trip" => Ok(ProviderKind::Osrm),
            "google" | "google-routes" => Ok(ProviderKind::Google),
            other => Err(RoutingError::Configuration(format!(
                "unknown routing provider {:?}",
                other
            ))),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub provider: ProviderKind,
    /// Wrap remote providers so upstream failures fall back to the heuristic.
    pub fallback_to_heuristic: bool,
    pub timeout: Duration,
    pub osrm_base_url: String,
    pub google_routes_url: String,
    pub google_api_key: Option<String>,
    pub google_routing_preference: String,
    pub heuristic: HeuristicSettings,
    pub bind_addr: SocketAddr,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Heuristic,
            fallback_to_heuristic: false,
            timeout: DEFAULT_TIMEOUT,
            osrm_base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            google_routes_url: DEFAULT_GOOGLE_ROUTES_URL.to_string(),
            google_api_key: None,
            google_routing_preference: DEFAULT_ROUTING_PREFERENCE.to_string(),
            heuristic: HeuristicSettings::default(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 7860)),
        }
    }
}

impl RoutingConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, RoutingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset or empty variables.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use tour_routing::config::{ProviderKind, RoutingConfig};
    ///
    /// let env = HashMap::from([("ROUTING_PROVIDER", "osrm"), ("ROUTING_TIMEOUT_SECS", "3")]);
    /// let config = RoutingConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.provider, ProviderKind::Osrm);
    /// assert_eq!(config.timeout.as_secs(), 3);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RoutingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("ROUTING_PROVIDER") {
            config.provider = v.parse()?;
        }
        if let Some(v) = get("ROUTING_FALLBACK") {
            config.fallback_to_heuristic = match v.parse::<ProviderKind>()? {
                ProviderKind::Heuristic => true,
                other => {
                    return Err(RoutingError::Configuration(format!(
                        "ROUTING_FALLBACK only supports heuristic, got {}",
                        other
                    )))
                }
            };
        }
        if let Some(v) = get("ROUTING_TIMEOUT_SECS") {
            let secs: u64 = parse_value("ROUTING_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(RoutingError::Configuration(
                    "ROUTING_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("OSRM_BASE_URL") {
            config.osrm_base_url = v;
        }
        if let Some(v) = get("GOOGLE_ROUTES_URL") {
            config.google_routes_url = v;
        }
        config.google_api_key = get("GOOGLE_MAPS_API_KEY");
        if let Some(v) = get("GOOGLE_ROUTING_PREFERENCE") {
            config.google_routing_preference = v;
        }
        if let Some(v) = get("HEURISTIC_SPEED_KMH") {
            let speed: f64 = parse_value("HEURISTIC_SPEED_KMH", &v)?;
            if !(speed.is_finite() && speed > 0.0) {
                return Err(RoutingError::Configuration(
                    "HEURISTIC_SPEED_KMH must be positive".to_string(),
                ));
            }
            config.heuristic.speed_kmh = speed;
        }
        if let Some(v) = get("HEURISTIC_DWELL_MINUTES") {
            let dwell: f64 = parse_value("HEURISTIC_DWELL_MINUTES", &v)?;
            if !(dwell.is_finite() && dwell >= 0.0) {
                return Err(RoutingError::Configuration(
                    "HEURISTIC_DWELL_MINUTES must not be negative".to_string(),
                ));
            }
            config.heuristic.dwell_minutes = dwell;
        }
        if let Some(v) = get("BIND_ADDR") {
            config.bind_addr = parse_value("BIND_ADDR", &v)?;
        }

        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, RoutingError> {
    value
        .trim()
        .parse()
        .map_err(|_| RoutingError::Configuration(format!("invalid {}: {:?}", key, value)))
}
