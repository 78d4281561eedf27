//! Poll scheduling settings.

use std::time::Duration;

/// How often a view refetches, and whether it fetches right away.
///
/// The interval is fixed for one run of a controller; changing it means
/// restarting the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    immediate: bool,
}

impl PollConfig {
    /// Validate and build a config.
    pub fn new(interval: Duration, immediate: bool) -> Result<Self, PollConfigError> {
        if interval.is_zero() {
            return Err(PollConfigError::ZeroInterval);
        }
        Ok(Self {
            interval,
            immediate,
        })
    }

    /// Fetch now, then every `interval`.
    pub fn every(interval: Duration) -> Result<Self, PollConfigError> {
        Self::new(interval, true)
    }

    /// Convenience for config values expressed in seconds.
    pub fn every_secs(secs: u64) -> Result<Self, PollConfigError> {
        Self::every(Duration::from_secs(secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn immediate(&self) -> bool {
        self.immediate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_rejected() {
        assert_eq!(
            PollConfig::every(Duration::ZERO),
            Err(PollConfigError::ZeroInterval)
        );
        assert_eq!(PollConfig::every_secs(0), Err(PollConfigError::ZeroInterval));
    }

    #[test]
    fn test_every_is_immediate() {
        let config = PollConfig::every_secs(5).unwrap();
        assert!(config.immediate());
        assert_eq!(config.interval(), Duration::from_secs(5));

        let deferred = PollConfig::new(Duration::from_millis(250), false).unwrap();
        assert!(!deferred.immediate());
    }
}
