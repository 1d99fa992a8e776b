use super::client::{failure_detail, FalHttpClient};
use super::TextService;
use crate::models::{AnyLlmRequest, AnyLlmResponse, Completion};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const MODEL_PATH: &str = "fal-ai/any-llm";

/// Text completion adapter over the `any-llm` endpoint.
pub struct FalTextClient {
    http: FalHttpClient,
}

impl FalTextClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: FalHttpClient::new(api_key, Duration::from_secs(30)),
        }
    }

    pub fn new_with_http(http: FalHttpClient) -> Self {
        Self { http }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl TextService for FalTextClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        model: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<Completion> {
        let request = AnyLlmRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            system_prompt: system.map(str::to_string),
            temperature,
            max_tokens,
            priority: "latency",
        };

        let response: AnyLlmResponse = self
            .http
            .post(MODEL_PATH, &request)
            .await
            .map_err(|e| Error::LlmFailed(failure_detail(e)))?;

        // The endpoint reports model-side failures in-band.
        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(Error::LlmFailed(error));
        }

        Ok(Completion {
            output: response.output,
            reasoning: response.reasoning,
        })
    }
}
