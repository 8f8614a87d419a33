//! Supabase connection configuration.

use std::time::Duration;

use hera_playbooks::AdapterError;

/// Connection settings for the Supabase REST surface.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL (e.g., "https://xyz.supabase.co").
    pub url: String,

    /// Service-role key used for RPC calls.
    pub service_role_key: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for audit emission.
    pub max_retries: u32,
}

impl SupabaseConfig {
    /// Create a configuration with default timeout and retry settings.
    pub fn new(url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_role_key: service_role_key.into(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` are required;
    /// `SUPABASE_TIMEOUT_SECS` and `SUPABASE_MAX_RETRIES` are optional.
    pub fn from_env() -> Result<Self, AdapterError> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| {
            AdapterError::Configuration("SUPABASE_URL is not set".to_string())
        })?;

        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
            AdapterError::Configuration("SUPABASE_SERVICE_ROLE_KEY is not set".to_string())
        })?;

        let timeout_secs: u64 = std::env::var("SUPABASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let max_retries: u32 = std::env::var("SUPABASE_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        Ok(Self {
            url,
            service_role_key,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SupabaseConfig::new("https://xyz.supabase.co", "key");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }
}
