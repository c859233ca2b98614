//! Executor configuration with builder pattern
//!
//! Execution is sequential unless tier parallelism is switched on.

/// How operations are dispatched to the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Run operations of one tier concurrently; tiers still run one after another
    pub parallel_tiers: bool,
    pub concurrency: ConcurrencyConfig,
}

/// Concurrency limiting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrencyConfig {
    /// Maximum adapter calls in flight at once
    pub max_concurrent_requests: usize,
    /// Whether concurrency limiting is enabled
    pub enabled: bool,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            enabled: true,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::sequential()
    }
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }

    /// One operation at a time, in plan order
    pub fn sequential() -> Self {
        Self {
            parallel_tiers: false,
            concurrency: ConcurrencyConfig::default(),
        }
    }

    /// Concurrent within a tier, bounded by `max_concurrent_requests`
    pub fn parallel(max_concurrent_requests: usize) -> Self {
        Self {
            parallel_tiers: true,
            concurrency: ConcurrencyConfig {
                max_concurrent_requests: max_concurrent_requests.max(1),
                enabled: true,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExecutorConfig::default(),
        }
    }

    pub fn parallel_tiers(mut self, enabled: bool) -> Self {
        self.config.parallel_tiers = enabled;
        self
    }

    pub fn max_concurrent_requests(mut self, max: usize) -> Self {
        self.config.concurrency.max_concurrent_requests = max.max(1);
        self
    }

    pub fn enable_concurrency_limiting(mut self, enabled: bool) -> Self {
        self.config.concurrency.enabled = enabled;
        self
    }

    pub fn build(self) -> ExecutorConfig {
        self.config
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sequential() {
        let config = ExecutorConfig::default();
        assert!(!config.parallel_tiers);
        assert_eq!(config, ExecutorConfig::sequential());
    }

    #[test]
    fn test_parallel_preset() {
        let config = ExecutorConfig::parallel(8);
        assert!(config.parallel_tiers);
        assert_eq!(config.concurrency.max_concurrent_requests, 8);

        assert_eq!(ExecutorConfig::parallel(0).concurrency.max_concurrent_requests, 1);
    }

    #[test]
    fn test_builder() {
        let config = ExecutorConfig::builder()
            .parallel_tiers(true)
            .max_concurrent_requests(2)
            .enable_concurrency_limiting(false)
            .build();

        assert!(config.parallel_tiers);
        assert_eq!(config.concurrency.max_concurrent_requests, 2);
        assert!(!config.concurrency.enabled);
    }
}
