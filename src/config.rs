//! # Queue configuration.
//!
//! Provides [`QueueConfig`] with the stall-supervision settings of a
//! [`TicketQueue`](crate::TicketQueue). Values are fixed once the queue is built.
//!
//! ## Sentinel values
//! - `timeout = 0s` → stall supervision disabled (no timers are ever armed)
//!
//! ## Untyped sources
//! The typed fields cannot hold negative values. Settings coming from untyped
//! sources (env vars, JSON numbers, CLI flags) go through
//! [`QueueConfig::from_millis`], which rejects negative inputs with a
//! [`ConfigError`].

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for a ticket queue.
///
/// ## Field semantics
/// - `timeout`: how long a ticket may stay head before it counts as stalled (`0s` = disabled)
/// - `retries`: how many times a stalled head is moved to the tail before it is evicted
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Time a head ticket may remain head before it is considered stalled.
    ///
    /// - `Duration::ZERO` = stall supervision disabled
    /// - `> 0` = one timer armed per head
    pub timeout: Duration,

    /// Number of times a stalled head is requeued before eviction.
    ///
    /// `0` means the first stall evicts the head.
    pub retries: u32,
}

impl QueueConfig {
    /// Builds a configuration from raw millisecond/count values.
    ///
    /// # Errors
    /// - [`ConfigError::NegativeTimeout`] if `timeout_ms < 0`
    /// - [`ConfigError::NegativeRetries`] if `retries < 0`
    ///
    /// Retry counts above `u32::MAX` saturate.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use turnstile::{ConfigError, QueueConfig};
    ///
    /// let cfg = QueueConfig::from_millis(500, 1).unwrap();
    /// assert_eq!(cfg.timeout, Duration::from_millis(500));
    /// assert_eq!(cfg.retries, 1);
    ///
    /// assert_eq!(
    ///     QueueConfig::from_millis(-1, 1),
    ///     Err(ConfigError::NegativeTimeout { value: -1 })
    /// );
    /// ```
    pub fn from_millis(timeout_ms: i64, retries: i64) -> Result<Self, ConfigError> {
        let timeout = u64::try_from(timeout_ms)
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::NegativeTimeout { value: timeout_ms })?;
        if retries < 0 {
            return Err(ConfigError::NegativeRetries { value: retries });
        }
        let retries = u32::try_from(retries).unwrap_or(u32::MAX);

        Ok(Self { timeout, retries })
    }

    /// Returns the stall timeout as an `Option`.
    ///
    /// - `None` → supervision disabled
    /// - `Some(d)` → a head that stays head for `d` is stalled
    #[inline]
    pub fn stall_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `timeout = 1s`
    /// - `retries = 3`
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(1));
        assert_eq!(cfg.retries, 3);
        assert_eq!(cfg.stall_timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_timeout_disables_supervision() {
        let cfg = QueueConfig::from_millis(0, 0).unwrap();
        assert_eq!(cfg.stall_timeout(), None);
        assert_eq!(cfg.retries, 0);
    }

    #[test]
    fn test_negative_values_are_rejected() {
        assert_eq!(
            QueueConfig::from_millis(-10, 3),
            Err(ConfigError::NegativeTimeout { value: -10 })
        );
        assert_eq!(
            QueueConfig::from_millis(10, -3),
            Err(ConfigError::NegativeRetries { value: -3 })
        );
    }

    #[test]
    fn test_timeout_checked_before_retries() {
        assert_eq!(
            QueueConfig::from_millis(-1, -1),
            Err(ConfigError::NegativeTimeout { value: -1 })
        );
    }

    #[test]
    fn test_huge_retries_saturate() {
        let cfg = QueueConfig::from_millis(1, i64::MAX).unwrap();
        assert_eq!(cfg.retries, u32::MAX);
    }

    #[test]
    fn test_max_timeout_is_a_valid_setting() {
        let cfg = QueueConfig {
            timeout: Duration::MAX,
            retries: 0,
        };
        assert_eq!(cfg.stall_timeout(), Some(Duration::MAX));
    }
}
