use super::client::{failure_detail, FalHttpClient};
use super::VisionService;
use crate::models::{AnyLlmRequest, AnyLlmResponse, CategorySet};
use crate::{extract, prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

// Vision-capable models live behind the enterprise endpoint.
const MODEL_PATH: &str = "fal-ai/any-llm/enterprise";

const ANALYSIS_MAX_TOKENS: u32 = 2000;

/// Vision analysis adapter: product image in, nine-field category set out.
pub struct FalVisionClient {
    http: FalHttpClient,
}

impl FalVisionClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: FalHttpClient::new(api_key, Duration::from_secs(60)),
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
impl VisionService for FalVisionClient {
    async fn analyze(
        &self,
        image_url: &str,
        model: &str,
        temperature: f32,
    ) -> Result<CategorySet> {
        // The endpoint takes multimodal input as a single prompt with the
        // image reference up front.
        let prompt = format!("Image URL: {}\n\n{}", image_url, prompts::ANALYZE_PRODUCT);

        let request = AnyLlmRequest {
            model: model.to_string(),
            prompt,
            system_prompt: None,
            temperature,
            max_tokens: Some(ANALYSIS_MAX_TOKENS),
            priority: "latency",
        };

        let response: AnyLlmResponse = self
            .http
            .post(MODEL_PATH, &request)
            .await
            .map_err(|e| Error::AnalysisFailed(failure_detail(e)))?;

        if let Some(error) = response.error.filter(|e| !e.is_empty()) {
            return Err(Error::AnalysisFailed(error));
        }

        extract::parse_categories(&response.output).map_err(|e| match e {
            Error::LlmFailed(detail) => Error::AnalysisFailed(detail),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn categories_json() -> &'static str {
        r#"{"main_product_type": "Footwear", "subcategory": "Sneakers",
            "target_audience": "Unisex", "price_range": "Mid-range",
            "use_case": "Daily Use", "style_design": "Streetwear",
            "season_occasion": "All Season", "industrial_type": "Footwear Manufacturing",
            "vibe": "Energetic"}"#
    }

    #[tokio::test]
    async fn test_analyze_embeds_image_url_in_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/enterprise"))
            .and(body_string_contains("Image URL: https://cdn.test/shoe.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": format!("Here is the classification:\n{}", categories_json())
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = FalVisionClient::new("key".to_string()).with_base_url(server.uri());

        let categories = client
            .analyze("https://cdn.test/shoe.jpg", "google/gemini-2.5-flash", 0.3)
            .await
            .unwrap();
        assert_eq!(categories.main_product_type, "Footwear");
        assert_eq!(categories.subcategory, "Sneakers");
    }

    #[tokio::test]
    async fn test_analyze_unparseable_output_is_analysis_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/enterprise"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": "I see a shoe but cannot classify it."
            })))
            .mount(&server)
            .await;

        let client = FalVisionClient::new("key".to_string()).with_base_url(server.uri());

        let err = client
            .analyze("https://cdn.test/shoe.jpg", "google/gemini-2.5-flash", 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AnalysisFailed(_)));
    }

    #[tokio::test]
    async fn test_analyze_provider_error_is_analysis_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/enterprise"))
            .respond_with(ResponseTemplate::new(500).set_body_string("exploded"))
            .mount(&server)
            .await;

        let client = FalVisionClient::new("key".to_string()).with_base_url(server.uri());

        let err = client
            .analyze("https://cdn.test/shoe.jpg", "google/gemini-2.5-flash", 0.3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AnalysisFailed(ref d) if d.contains("exploded")));
    }
}
