use std::time::Duration;

/// Bounded exponential backoff used while re-establishing a dropped session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl ReconnectPolicy {
    /// Wait after the failed `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub countdown_tick: Duration,
    pub connect_timeout: Duration,
    pub liveness_timeout: Duration,
    /// Inter-item delays at least this long are followed by a liveness check,
    /// since servers tend to drop idle sessions after about a minute.
    pub idle_check_threshold: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            countdown_tick: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(15),
            liveness_timeout: Duration::from_secs(10),
            idle_check_threshold: Duration::from_secs(55),
            reconnect: ReconnectPolicy::default(),
        }
    }
}
