//! Colorful console output for the server.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::config::RoutingConfig;
use crate::domain::OptimizedRoute;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  _____                  ____             _   _
 |_   _|__  _   _ _ __  |  _ \ ___  _   _| |_(_)_ __   __ _
   | |/ _ \| | | | '__| | |_) / _ \| | | | __| | '_ \ / _` |
   | | (_) | |_| | |    |  _ < (_) | |_| | |_| | | | | (_| |
   |_|\___/ \__,_|_|    |_| \_\___/ \__,_|\__|_|_| |_|\__, |
                                                      |___/
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Tour Route Optimization".bright_cyan()
    );
}

/// Prints the active routing configuration.
pub fn print_config(config: &RoutingConfig) {
    let fallback = if config.fallback_to_heuristic {
        "heuristic".bright_yellow().to_string()
    } else {
        "none".white().to_string()
    };
    println!(
        "{} {} {} provider ({}), fallback ({}), timeout ({}), listening on {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Routing]".bright_cyan(),
        config.provider.as_str().bright_magenta().bold(),
        fallback,
        format_duration(config.timeout).yellow(),
        config.bind_addr.to_string().white().bold()
    );
}

/// Prints a one-line summary of an optimized tour.
pub fn print_route_summary(provider: &str, route: &OptimizedRoute, elapsed: Duration) {
    let meters = (route.total_distance_km * 1000.0).round() as u64;
    println!(
        "{} {} {} stops ({}), distance ({} m), duration ({} min), time spent ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", provider).bright_cyan(),
        route.stops.len().to_formatted_string(&Locale::en).bright_yellow(),
        meters.to_formatted_string(&Locale::en).bright_magenta().bold(),
        format!("{:.0}", route.total_duration_minutes).white(),
        format_duration(elapsed).yellow()
    );
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
