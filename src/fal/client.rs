use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, Retry};

const DEFAULT_BASE_URL: &str = "https://fal.run";

/// Shared HTTP plumbing for the FAL synchronous inference endpoints.
///
/// Carries the authorization header, the per-capability timeout, and the
/// retry policy. Retries default to off; enabling them here is the only
/// place a retry policy lives, so callers never change when one is added.
pub struct FalHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: usize,
}

impl FalHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(
            api_key,
            Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        )
    }

    /// Reuse an externally built `reqwest::Client` (shared connection pool).
    pub fn new_with_client(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// POST JSON arguments to a model path (e.g. `fal-ai/any-llm`) and
    /// deserialize the result payload.
    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model_path: &str,
        request: &Req,
    ) -> Result<Resp> {
        match self.retry {
            None => self.post_once(model_path, request).await,
            Some(policy) => {
                let strategy = FixedInterval::new(policy.delay).take(policy.max_retries);
                Retry::spawn(strategy, || self.post_once(model_path, request)).await
            }
        }
    }

    async fn post_once<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model_path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}/{}", self.base_url, model_path);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to {}: {}", model_path, e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "FAL API error on {} (status {}): {}",
                model_path,
                status,
                error_text
            );
            return Err(Error::Internal(format!(
                "provider error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}\nBody: {}", model_path, e, body);
            Error::Internal(format!("unparseable provider response: {}", e))
        })
    }
}

/// Flatten a transport or provider error into the detail string carried by
/// a capability failure.
pub(crate) fn failure_detail(err: Error) -> String {
    match err {
        Error::Internal(detail) => detail,
        other => other.to_string(),
    }
}
