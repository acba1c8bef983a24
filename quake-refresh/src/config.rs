use std::time::Duration;
use thiserror::Error;

/// Default pause between two scheduled fetches.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound of the interval used after a failure.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Default quiet period before a context change triggers a fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("refresh interval must be positive")]
    ZeroInterval,

    #[error("maximum backoff {max_backoff:?} must be longer than the interval {interval:?}")]
    BackoffTooShort {
        interval: Duration,
        max_backoff: Duration,
    },
}

/// Timing of the refresh loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshConfig {
    pub interval: Duration,
    pub max_backoff: Duration,
    pub debounce: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval: DEFAULT_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_backoff <= self.interval {
            return Err(ConfigError::BackoffTooShort {
                interval: self.interval,
                max_backoff: self.max_backoff,
            });
        }
        Ok(())
    }

    /// Interval used after an acknowledged failure: twice the normal
    /// interval, capped at `max_backoff`.
    pub fn backoff(&self) -> Duration {
        self.interval.saturating_mul(2).min(self.max_backoff)
    }
}
