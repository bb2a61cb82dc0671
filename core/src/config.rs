//! Service endpoints and timeouts.
//!
//! Fixed at construction; nothing in the crate mutates a config after a
//! gateway or client has been built from it.

use std::env;
use std::time::Duration;

pub const DEFAULT_PRIMARY_URL: &str = "https://localhost:18443/route-management-service";
pub const DEFAULT_NAVIGATOR_URL: &str = "https://localhost:18444/navigator-service";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub primary_url: String,
    pub navigator_url: String,
    /// Per-call timeout for every operation except the availability probe.
    pub timeout: Duration,
    pub probe_timeout: Duration,
    /// Accept self-signed certificates. The services are usually reached
    /// through an SSH tunnel to `localhost`.
    pub accept_invalid_certs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            navigator_url: DEFAULT_NAVIGATOR_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl ServiceConfig {
    pub fn new(primary_url: &str, navigator_url: &str) -> Self {
        Self {
            primary_url: primary_url.to_string(),
            navigator_url: navigator_url.to_string(),
            ..Self::default()
        }
    }

    /// Read `ROUTES_PRIMARY_URL`, `ROUTES_NAVIGATOR_URL`,
    /// `ROUTES_API_TIMEOUT_MS` and `ROUTES_ACCEPT_INVALID_CERTS`. Missing or
    /// unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("ROUTES_PRIMARY_URL").filter(|v| !v.trim().is_empty()) {
            config.primary_url = url;
        }
        if let Some(url) = lookup("ROUTES_NAVIGATOR_URL").filter(|v| !v.trim().is_empty()) {
            config.navigator_url = url;
        }
        match lookup("ROUTES_API_TIMEOUT_MS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(ms)) if ms > 0 => config.timeout = Duration::from_millis(ms),
            Some(_) => tracing::warn!("ignoring invalid ROUTES_API_TIMEOUT_MS"),
            None => {}
        }
        if let Some(flag) = lookup("ROUTES_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = matches!(flag.trim(), "1" | "true" | "yes");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        assert_eq!(ServiceConfig::from_lookup(lookup(&[])), ServiceConfig::default());
    }

    #[test]
    fn reads_urls_and_timeout() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("ROUTES_PRIMARY_URL", "http://a:1/p"),
            ("ROUTES_NAVIGATOR_URL", "http://b:2/n"),
            ("ROUTES_API_TIMEOUT_MS", "2500"),
            ("ROUTES_ACCEPT_INVALID_CERTS", "true"),
        ]));
        assert_eq!(config.primary_url, "http://a:1/p");
        assert_eq!(config.navigator_url, "http://b:2/n");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        let config = ServiceConfig::from_lookup(lookup(&[("ROUTES_API_TIMEOUT_MS", "soon")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        let config = ServiceConfig::from_lookup(lookup(&[("ROUTES_API_TIMEOUT_MS", "0")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
