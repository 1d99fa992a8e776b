use super::client::{failure_detail, FalHttpClient};
use super::{BackgroundService, GeneratedImage};
use crate::models::{BackgroundEditRequest, BackgroundEditResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const MODEL_PATH: &str = "fal-ai/nano-banana/edit";

/// Image-to-image background generation adapter.
///
/// The slowest capability in the pipeline; its timeout is deliberately
/// generous.
pub struct FalImageClient {
    http: FalHttpClient,
}

impl FalImageClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: FalHttpClient::new(api_key, Duration::from_secs(120)),
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

    fn build_prompt(prompt: &str, remove_background: bool) -> String {
        let styled = format!(
            "{}, product photography, high quality, professional lighting",
            prompt
        );
        if remove_background {
            format!(
                "Replace the original background entirely, keeping the product untouched. {}",
                styled
            )
        } else {
            styled
        }
    }
}

#[async_trait]
impl BackgroundService for FalImageClient {
    async fn generate(
        &self,
        image_url: &str,
        prompt: &str,
        remove_background: bool,
    ) -> Result<GeneratedImage> {
        let request = BackgroundEditRequest {
            prompt: Self::build_prompt(prompt, remove_background),
            image_urls: vec![image_url.to_string()],
            num_images: 1,
            output_format: "jpeg",
        };

        let response: BackgroundEditResponse = self
            .http
            .post(MODEL_PATH, &request)
            .await
            .map_err(|e| Error::GenerationFailed(failure_detail(e)))?;

        // A 200 without a complete image payload is a shaped failure, not
        // a crash.
        let image = response.images.into_iter().next().ok_or(Error::NoOutput)?;
        match (image.url, image.width, image.height) {
            (Some(url), Some(width), Some(height)) => Ok(GeneratedImage { url, width, height }),
            _ => Err(Error::NoOutput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_parses_image_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/nano-banana/edit"))
            .and(body_string_contains("https://cdn.test/mug.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [{
                    "url": "https://fal.media/files/result.jpg",
                    "content_type": "image/jpeg",
                    "width": 1024,
                    "height": 1024
                }]
            })))
            .mount(&server)
            .await;

        let client = FalImageClient::new("key".to_string()).with_base_url(server.uri());

        let image = client
            .generate("https://cdn.test/mug.jpg", "soft studio light", true)
            .await
            .unwrap();
        assert_eq!(image.url, "https://fal.media/files/result.jpg");
        assert_eq!((image.width, image.height), (1024, 1024));
    }

    #[tokio::test]
    async fn test_generate_missing_url_is_no_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/nano-banana/edit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "images": [{}]
            })))
            .mount(&server)
            .await;

        let client = FalImageClient::new("key".to_string()).with_base_url(server.uri());

        let err = client
            .generate("https://cdn.test/mug.jpg", "soft studio light", true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoOutput));
    }

    #[tokio::test]
    async fn test_generate_empty_images_is_no_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/nano-banana/edit"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"images": []})),
            )
            .mount(&server)
            .await;

        let client = FalImageClient::new("key".to_string()).with_base_url(server.uri());

        let err = client
            .generate("https://cdn.test/mug.jpg", "prompt", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoOutput));
    }

    #[tokio::test]
    async fn test_generate_provider_error_is_generation_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/fal-ai/nano-banana/edit"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unsafe prompt"))
            .mount(&server)
            .await;

        let client = FalImageClient::new("key".to_string()).with_base_url(server.uri());

        let err = client
            .generate("https://cdn.test/mug.jpg", "prompt", true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GenerationFailed(ref d) if d.contains("unsafe prompt")));
    }

    #[test]
    fn test_build_prompt_styles_and_remove_flag() {
        let kept = FalImageClient::build_prompt("warm beige backdrop", false);
        assert!(kept.starts_with("warm beige backdrop, product photography"));

        let removed = FalImageClient::build_prompt("warm beige backdrop", true);
        assert!(removed.starts_with("Replace the original background entirely"));
        assert!(removed.contains("warm beige backdrop"));
    }
}
