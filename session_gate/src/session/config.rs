use std::sync::LazyLock;

use chrono::Duration;

/// Sliding session window in seconds
///
/// Default: 30
pub static SESSION_TTL_SECONDS: LazyLock<i64> = LazyLock::new(|| {
    std::env::var("SESSION_TTL_SECONDS")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(30)
});

/// Runtime settings of a [`crate::SessionStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Window added to "now" on issue and on every successful refresh
    pub ttl: Duration,
}

impl SessionConfig {
    pub fn with_ttl_seconds(seconds: i64) -> Self {
        Self {
            ttl: Duration::try_seconds(seconds).unwrap_or_else(|| Duration::seconds(30)),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::with_ttl_seconds(*SESSION_TTL_SECONDS)
    }
}
