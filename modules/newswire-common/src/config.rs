use std::env;

/// Pipeline configuration loaded from environment variables.
/// Every knob has a default so a bare environment works.
#[derive(Debug, Clone)]
pub struct Config {
    /// Concurrency bound for batch ingest/process fan-out.
    pub max_in_flight: usize,
    /// Default retention horizon for `delete_older_than` sweeps.
    pub retention_days: i64,
    /// Default window for `recent` queries.
    pub recent_window_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            max_in_flight: env_or("PIPELINE_MAX_IN_FLIGHT", 10),
            retention_days: env_or("PIPELINE_RETENTION_DAYS", 30),
            recent_window_hours: env_or("PIPELINE_RECENT_WINDOW_HOURS", 24),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_in_flight: 10,
            retention_days: 30,
            recent_window_hours: 24,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got: {v}")),
        Err(_) => default,
    }
}
