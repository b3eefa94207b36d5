use std::time::Duration;

/// Session pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of sessions leased at the same time
    pub max_sessions: usize,

    /// Sessions opened eagerly at pool construction
    pub min_idle: usize,

    /// How long `lease` may wait for a free slot before failing
    pub acquire_timeout: Duration,

    /// Idle sessions older than this are retired
    pub idle_timeout: Option<Duration>,

    /// Maximum session lifetime
    pub max_lifetime: Option<Duration>,
}

impl PoolConfig {
    pub fn new() -> Self {
        Self {
            max_sessions: 64,
            min_idle: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    pub fn min_idle(mut self, min: usize) -> Self {
        self.min_idle = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_sessions == 0 {
            return Err("max_sessions must be > 0".to_string());
        }

        if self.min_idle > self.max_sessions {
            return Err("min_idle cannot exceed max_sessions".to_string());
        }

        if self.acquire_timeout.is_zero() {
            return Err("acquire_timeout must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
