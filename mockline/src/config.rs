use std::time::Duration;

/// Runtime configuration for a [`MockContext`](crate::MockContext).
///
/// Controls how long verification waits for asynchronous pipelines, how
/// much room the call ledger reserves, and what happens when a processor
/// type cannot be intercepted. Use the builder pattern to customize, or use
/// [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use mockline::MockConfig;
///
/// let config = MockConfig::default()
///     .with_settle_timeout(Duration::from_secs(1))  // Fail fast on hung pipelines
///     .with_ledger_capacity(1024)                   // Many calls per test
///     .with_fallback_to_real(false);                // Refuse unmockable processors
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MockConfig {
    /// Upper bound on how long verification waits for in-flight pipeline
    /// executions before reporting them.
    /// Default: 5s
    settle_timeout: Duration,

    /// Number of calls the ledger allocates room for up front.
    /// Default: 256
    ledger_capacity: usize,

    /// Whether a processor type that cannot be intercepted is built as a
    /// real, unrecorded instance (with a warning) or rejected.
    /// Default: true
    fallback_to_real: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        MockConfig {
            settle_timeout: Duration::from_secs(5),
            ledger_capacity: 256,
            fallback_to_real: true,
        }
    }
}

impl MockConfig {
    /// Set the default wait for pipeline quiescence during verification.
    ///
    /// Individual verifications can override this with
    /// [`VerifyCall::within`](crate::VerifyCall::within).
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Returns the default wait for pipeline quiescence.
    pub fn settle_timeout(&self) -> Duration {
        self.settle_timeout
    }

    /// Set the initial capacity of the call ledger.
    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = capacity;
        self
    }

    /// Returns the initial capacity of the call ledger.
    pub fn ledger_capacity(&self) -> usize {
        self.ledger_capacity
    }

    /// Choose whether unmockable processor types fall back to real instances.
    ///
    /// When `false`, creating such a processor fails with
    /// [`Error::ProxyUnavailable`](crate::Error::ProxyUnavailable).
    pub fn with_fallback_to_real(mut self, fallback: bool) -> Self {
        self.fallback_to_real = fallback;
        self
    }

    /// Returns whether unmockable processor types fall back to real instances.
    pub fn fallback_to_real(&self) -> bool {
        self.fallback_to_real
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MockConfig::default();
        assert_eq!(config.settle_timeout(), Duration::from_secs(5));
        assert_eq!(config.ledger_capacity(), 256);
        assert!(config.fallback_to_real());
    }

    #[test]
    fn builder_overrides() {
        let config = MockConfig::default()
            .with_settle_timeout(Duration::from_millis(50))
            .with_ledger_capacity(8)
            .with_fallback_to_real(false);
        assert_eq!(config.settle_timeout(), Duration::from_millis(50));
        assert_eq!(config.ledger_capacity(), 8);
        assert!(!config.fallback_to_real());
    }
}
