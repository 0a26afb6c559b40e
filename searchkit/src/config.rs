//! Configuration for the search client.

use std::time::Duration;

use crate::error::{Result, SearchError};

/// Configuration parameters for a [`SearchClient`](crate::SearchClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Deadline applied to each network call. `None` disables the deadline.
    /// On expiry the call fails with [`SearchError::Timeout`]; it is never
    /// silently retried.
    pub request_timeout: Option<Duration>,
    /// Initial delay between visibility polls. Doubles after every attempt.
    pub poll_interval: Duration,
    /// Maximum number of visibility polls before giving up with
    /// [`SearchError::Timeout`].
    pub poll_max_attempts: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            poll_interval: Duration::from_millis(250),
            poll_max_attempts: 8,
        }
    }
}

impl ClientConfig {
    /// Create a new builder for constructing a [`ClientConfig`].
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the per-call network deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Set the initial delay between visibility polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the maximum number of visibility polls.
    pub fn poll_max_attempts(mut self, attempts: usize) -> Self {
        self.config.poll_max_attempts = attempts;
        self
    }

    /// Build the [`ClientConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ConfigError`] if:
    /// - `poll_interval` is zero
    /// - `poll_max_attempts` is zero
    pub fn build(self) -> Result<ClientConfig> {
        if self.config.poll_interval.is_zero() {
            return Err(SearchError::ConfigError(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.config.poll_max_attempts == 0 {
            return Err(SearchError::ConfigError(
                "poll_max_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ClientConfig::builder().build().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = ClientConfig::builder()
            .poll_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_poll_attempts() {
        let err = ClientConfig::builder().poll_max_attempts(0).build().unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }
}
