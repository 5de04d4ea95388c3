use std::str::FromStr;
use std::time::Duration;

use crate::ingress::BackoffConfig;

// Defaults match the sensor board's original dashboard page: 30 chart
// points, 8 history rows, one render per 100 ms.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";
const DEFAULT_CHART_POINTS: usize = 30;
const DEFAULT_HISTORY_ROWS: usize = 8;
const DEFAULT_THROTTLE_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// WebSocket endpoint the ingress connects to.
    pub endpoint: String,
    /// Rolling window capacity per chart metric.
    pub chart_points: usize,
    /// Bounded history table size (presentation side).
    pub history_rows: usize,
    /// Minimum interval between render passes.
    pub update_throttle: Duration,
    pub reconnect: BackoffConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chart_points: DEFAULT_CHART_POINTS,
            history_rows: DEFAULT_HISTORY_ROWS,
            update_throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            reconnect: BackoffConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Read overrides from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = std::env::var("BUSWATCH_WS_URL")
            && !url.trim().is_empty()
        {
            cfg.endpoint = url;
        }

        cfg.chart_points = env_parse("BUSWATCH_CHART_POINTS", cfg.chart_points).clamp(2, 10_000);
        cfg.history_rows = env_parse("BUSWATCH_HISTORY_ROWS", cfg.history_rows).clamp(1, 1_000);
        cfg.update_throttle = Duration::from_millis(
            env_parse("BUSWATCH_THROTTLE_MS", DEFAULT_THROTTLE_MS).clamp(10, 10_000),
        );

        cfg.reconnect.base = Duration::from_millis(
            env_parse("BUSWATCH_RECONNECT_BASE_MS", cfg.reconnect.base.as_millis() as u64)
                .clamp(10, 600_000),
        );
        cfg.reconnect.max = Duration::from_millis(
            env_parse("BUSWATCH_RECONNECT_MAX_MS", cfg.reconnect.max.as_millis() as u64)
                .clamp(cfg.reconnect.base.as_millis() as u64, 3_600_000),
        );
        cfg.reconnect.jitter_max = Duration::from_millis(env_parse(
            "BUSWATCH_RECONNECT_JITTER_MS",
            cfg.reconnect.jitter_max.as_millis() as u64,
        ));

        cfg
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_dashboard() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.chart_points, 30);
        assert_eq!(cfg.history_rows, 8);
        assert_eq!(cfg.update_throttle, Duration::from_millis(100));
        assert_eq!(cfg.reconnect.base, Duration::from_millis(1000));
        assert_eq!(cfg.reconnect.max, Duration::from_millis(30_000));
        assert_eq!(cfg.reconnect.jitter_max, Duration::from_millis(1000));
    }
}
