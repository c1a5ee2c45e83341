use std::time::Duration;

/// How long a single outbound request may take before it is abandoned
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Master playlists pointing to master playlists are followed at most this many times
pub const DEFAULT_MAX_VARIANT_HOPS: usize = 5;

/// Tunables of a [`crate::ChannelValidator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub timeout: Duration,
    pub max_variant_hops: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_variant_hops: DEFAULT_MAX_VARIANT_HOPS,
        }
    }
}

impl ValidatorConfig {
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
