pub mod recent;
pub mod state;

use std::time::Duration;

pub const DEFAULT_POLL_SECS: u64 = 60;
pub const MIN_POLL_SECS: u64 = 5;

/// Poll interval as persisted, clamped so a hand-edited state file can't hammer the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PollInterval(u64);

impl PollInterval {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs.max(MIN_POLL_SECS))
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0.max(MIN_POLL_SECS))
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self(DEFAULT_POLL_SECS)
    }
}

pub const PROXY_URL_ENV: &str = "TICKLINE_PROXY_URL";
pub const API_KEY_ENV: &str = "TICKLINE_API_KEY";
pub const API_SECRET_ENV: &str = "TICKLINE_API_SECRET";

/// Credential reference from the profile store (the process environment).
/// Blank or missing parts yield `None`.
pub fn credential_from_env() -> Option<exchange::CredentialRef> {
    let key = std::env::var(API_KEY_ENV).ok()?;
    let secret = std::env::var(API_SECRET_ENV).ok()?;
    exchange::CredentialRef::new(key, secret)
}

/// Environment first, then the persisted value, then the built-in default
pub fn resolve_proxy_url(persisted: Option<&str>) -> String {
    std::env::var(PROXY_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .or_else(|| persisted.map(str::to_string))
        .unwrap_or_else(|| exchange::adapter::proxy::DEFAULT_BASE_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_has_a_floor() {
        assert_eq!(PollInterval::from_secs(0).as_duration(), Duration::from_secs(MIN_POLL_SECS));
        assert_eq!(PollInterval::default().as_duration(), Duration::from_secs(60));
    }
}
