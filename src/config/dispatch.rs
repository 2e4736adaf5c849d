use std::time::Duration;

/// Tuning for the campaign send fan-out.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of mail sends in flight at once.
    pub max_in_flight: usize,
    /// Upper bound on a single send before it counts as failed.
    pub send_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 16,
            send_timeout: Duration::from_secs(10),
        }
    }
}
