//! PostgREST RPC client.

use std::time::Duration;

use hera_playbooks::AdapterError;

use crate::config::SupabaseConfig;

/// HTTP client for Supabase `/rest/v1/rpc/<function>` calls.
#[derive(Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
    max_retries: u32,
}

impl RpcClient {
    /// Create a client from a configuration.
    pub fn new(config: &SupabaseConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
            max_retries: config.max_retries,
        }
    }

    /// Call an RPC function with JSON arguments.
    ///
    /// Returns the parsed JSON response, or `Null` for an empty body.
    pub async fn call(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> Result<serde_json::Value, AdapterError> {
        let response = self
            .client
            .post(format!("{}/rest/v1/rpc/{}", self.base_url, function))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(args)
            .send()
            .await
            .map_err(|e| AdapterError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdapterError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(AdapterError::Http(format!(
                "{} returned {}: {}",
                function, status, body
            )));
        }

        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| AdapterError::Json(e.to_string()))
    }

    /// Call an RPC function, retrying transport failures with exponential
    /// backoff.
    pub async fn call_with_retry(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> Result<serde_json::Value, AdapterError> {
        let mut delay = Duration::from_millis(500);

        for attempt in 0..=self.max_retries {
            match self.call(function, args).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries => {
                    tracing::warn!(
                        function,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "RPC call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(10));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(serde_json::Value::Null)
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}
