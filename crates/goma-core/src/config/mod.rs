//! Runtime configuration for goma clients.
//!
//! Holds the public endpoints/keys needed to reach the managed backend plus
//! the local database location. Secret credentials must never be stored here.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default reachability-probe timeout
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 4;

/// Client configuration for the offline store and remote backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OfflineConfig {
    /// Managed backend project URL (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key sent with every REST call
    pub supabase_anon_key: String,
    /// Local database file path
    pub db_path: PathBuf,
    /// Reachability-probe timeout in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

const fn default_probe_timeout_secs() -> u64 {
    DEFAULT_PROBE_TIMEOUT_SECS
}

impl OfflineConfig {
    /// Build a configuration, normalizing and validating the endpoint
    pub fn new(
        supabase_url: impl Into<String>,
        supabase_anon_key: impl Into<String>,
        db_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let supabase_url = normalize_text_option(Some(supabase_url.into()))
            .ok_or_else(|| Error::Validation("supabase url must not be empty".into()))?;
        if !is_http_url(&supabase_url) {
            return Err(Error::Validation(
                "supabase url must include http:// or https://".into(),
            ));
        }

        let supabase_anon_key = normalize_text_option(Some(supabase_anon_key.into()))
            .ok_or_else(|| Error::Validation("supabase anon key must not be empty".into()))?;

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key,
            db_path: db_path.into(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        })
    }

    /// Resolve configuration from `GOMA_SUPABASE_URL`, `GOMA_SUPABASE_ANON_KEY`
    /// and `GOMA_DB_PATH` (defaults to `goma.db` in the working directory)
    pub fn from_env() -> Result<Self> {
        let url = env::var("GOMA_SUPABASE_URL")
            .map_err(|_| Error::Validation("GOMA_SUPABASE_URL is not set".into()))?;
        let key = env::var("GOMA_SUPABASE_ANON_KEY")
            .map_err(|_| Error::Validation("GOMA_SUPABASE_ANON_KEY is not set".into()))?;
        let db_path = env::var("GOMA_DB_PATH").unwrap_or_else(|_| "goma.db".to_string());

        Self::new(url, key, db_path)
    }

    /// Probe timeout as a `Duration`
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// PostgREST base URL for table-scoped calls
    #[must_use]
    pub fn rest_base_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_endpoint() {
        assert!(OfflineConfig::new("", "anon", "goma.db").is_err());
        assert!(OfflineConfig::new("xyz.supabase.co", "anon", "goma.db").is_err());
        assert!(OfflineConfig::new("https://xyz.supabase.co", "  ", "goma.db").is_err());
    }

    #[test]
    fn new_normalizes_trailing_slash() {
        let config = OfflineConfig::new("https://xyz.supabase.co/", "anon", "goma.db").unwrap();
        assert_eq!(config.supabase_url, "https://xyz.supabase.co");
        assert_eq!(config.rest_base_url(), "https://xyz.supabase.co/rest/v1");
    }

    #[test]
    fn probe_timeout_defaults() {
        let config = OfflineConfig::new("https://xyz.supabase.co", "anon", "goma.db").unwrap();
        assert_eq!(config.probe_timeout(), Duration::from_secs(4));
    }
}
