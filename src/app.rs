//! Application orchestration for the generation pipeline.
//!
//! `App` is the single place where capability failures become the
//! caller-facing taxonomy. Each operation is a strictly sequential chain
//! of capability calls; lower layers (prompt synthesis) degrade instead of
//! failing, so what reaches this level is either success or a typed error.

use crate::fal::{
    BackgroundService, FalImageClient, FalTextClient, FalVisionClient, TextService, VisionService,
};
use crate::models::{
    AnalyzeRequest, CategorySet, Config, CopyMeta, DescriptionRequest, DescriptionResponse,
    GenerateRequest, GenerationResult, KitRequest, KitResponse, Language, Tone,
};
use crate::storage::{StorageClient, StorageService};
use crate::synth::PromptSynthesizer;
use crate::{extract, prompts, Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Coordinates prompt synthesis, storage, and inference capabilities for
/// one request at a time.
pub struct App {
    text: Arc<dyn TextService>,
    vision: Box<dyn VisionService>,
    background: Box<dyn BackgroundService>,
    storage: Box<dyn StorageService>,
    synthesizer: PromptSynthesizer,
    copy_model: String,
    uploads_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Arc<dyn TextService>,
    pub vision: Box<dyn VisionService>,
    pub background: Box<dyn BackgroundService>,
    pub storage: Box<dyn StorageService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses
    /// that need to inject mocks.
    pub fn with_services(services: AppServices, copy_model: String, uploads_dir: PathBuf) -> Self {
        let synthesizer = PromptSynthesizer::new(services.text.clone(), copy_model.clone());
        Self {
            text: services.text,
            vision: services.vision,
            background: services.background,
            storage: services.storage,
            synthesizer,
            copy_model,
            uploads_dir,
        }
    }

    /// Seed the default-pool selection; for deterministic tests.
    pub fn with_prompt_seed(mut self, seed: u64) -> Self {
        self.synthesizer = self.synthesizer.with_seed(seed);
        self
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn from_config(config: &Config) -> Result<Self> {
        let text = Arc::new(FalTextClient::new(config.fal_api_key.clone()));
        let vision = Box::new(FalVisionClient::new(config.fal_api_key.clone()));
        let background = Box::new(FalImageClient::new(config.fal_api_key.clone()));
        let storage = Box::new(
            StorageClient::new(
                config.storage_access_key_id.clone(),
                config.storage_secret_access_key.clone(),
                config.storage_endpoint.clone(),
                config.storage_bucket.clone(),
                config.storage_base_url.clone(),
            )
            .await?,
        );

        Ok(Self::with_services(
            AppServices {
                text,
                vision,
                background,
                storage,
            },
            config.copy_model.clone(),
            PathBuf::from(&config.uploads_dir),
        ))
    }

    /// Full background pipeline: localize, resolve a prompt, generate.
    pub async fn generate_background(&self, request: GenerateRequest) -> Result<GenerationResult> {
        let started = Instant::now();
        info!("Generating background for {}", request.input_image_url);

        let image_url = self.localize_reference(&request.input_image_url).await?;

        let used_prompt = self
            .synthesizer
            .resolve(request.prompt.as_deref(), request.categories.as_ref())
            .await;

        let image = self
            .background
            .generate(&image_url, &used_prompt.text, request.remove_bg)
            .await?;

        info!(
            "Background generated ({}x{}, origin {:?}) in {:?}",
            image.width,
            image.height,
            used_prompt.origin,
            started.elapsed()
        );

        Ok(GenerationResult {
            result_url: image.url,
            width: image.width,
            height: image.height,
            used_prompt,
        })
    }

    /// Classify a product photo into the nine-field category set.
    pub async fn analyze_product(&self, request: AnalyzeRequest) -> Result<CategorySet> {
        let started = Instant::now();
        info!(
            "Analyzing product image {} with model {}",
            request.image_url, request.model
        );

        let image_url = self.localize_reference(&request.image_url).await?;

        let categories = self
            .vision
            .analyze(&image_url, &request.model, request.temperature)
            .await?;

        info!(
            "Analysis finished ({}) in {:?}",
            categories.main_product_type,
            started.elapsed()
        );
        Ok(categories)
    }

    /// Generate a short product description.
    pub async fn generate_description(
        &self,
        request: DescriptionRequest,
    ) -> Result<DescriptionResponse> {
        let started = Instant::now();

        let system = match request.language {
            Language::Tr => prompts::DESCRIPTION_SYSTEM_TR,
            Language::En => prompts::DESCRIPTION_SYSTEM_EN,
        };

        let mut lines = copy_brief_lines(
            &request.title,
            request.industry.as_deref(),
            request.features.as_deref(),
            request.language,
        );
        lines.push(description_output_line(request.language, request.tone));

        let completion = self
            .text
            .complete(
                &lines.join("\n"),
                Some(system),
                &self.copy_model,
                request.temperature,
                Some(request.max_tokens),
            )
            .await?;

        info!(
            "Description generated for '{}' with {} in {:?}",
            truncate(&request.title, 50),
            self.copy_model,
            started.elapsed()
        );

        Ok(DescriptionResponse {
            model: self.copy_model.clone(),
            language: request.language,
            tone: request.tone,
            description: completion.output,
            meta: CopyMeta {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                reasoning: completion.reasoning,
            },
        })
    }

    /// Generate a complete marketing kit, or fail wholesale.
    pub async fn generate_marketing_kit(&self, request: KitRequest) -> Result<KitResponse> {
        let started = Instant::now();

        let (system, template) = match request.language {
            Language::Tr => (prompts::KIT_SYSTEM_TR, prompts::KIT_USER_TR),
            Language::En => (prompts::KIT_SYSTEM_EN, prompts::KIT_USER_EN),
        };
        let (ig_rule, tt_rule) = kit_caption_rules(request.language, request.tone);

        let mut lines = copy_brief_lines(
            &request.title,
            request.industry.as_deref(),
            request.features.as_deref(),
            request.language,
        );
        lines.push(String::new());
        lines.push(prompts::render(
            template,
            &[("ig_rule", ig_rule), ("tt_rule", tt_rule)],
        ));

        let completion = self
            .text
            .complete(
                &lines.join("\n"),
                Some(system),
                &self.copy_model,
                request.temperature,
                Some(request.max_tokens),
            )
            .await?;

        let kit = extract::parse_marketing_kit(&completion.output).map_err(|e| {
            warn!(
                "Marketing kit output for '{}' failed validation: {}",
                truncate(&request.title, 50),
                e
            );
            e
        })?;

        info!(
            "Marketing kit generated for '{}' with {} in {:?}",
            truncate(&request.title, 50),
            self.copy_model,
            started.elapsed()
        );

        Ok(KitResponse {
            language: request.language,
            tone: request.tone,
            model: self.copy_model.clone(),
            kit,
            meta: CopyMeta {
                max_tokens: request.max_tokens,
                temperature: request.temperature,
                reasoning: completion.reasoning,
            },
        })
    }

    /// Rewrite loopback-hosted references by staging the file into the
    /// image store; the generation provider cannot reach private hosts.
    async fn localize_reference(&self, reference: &str) -> Result<String> {
        let url = reqwest::Url::parse(reference)
            .map_err(|_| Error::Validation(format!("invalid image URL: {}", reference)))?;

        if !is_loopback_host(&url) {
            return Ok(reference.to_string());
        }

        // Only the final path segment is honored, so crafted references
        // cannot escape the uploads directory.
        let file_name = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty() && *name != "..")
            .ok_or_else(|| {
                Error::UploadFailed(format!("local reference has no file name: {}", reference))
            })?;

        let local_path = self.uploads_dir.join(file_name);
        info!(
            "Local reference detected, staging {} into the image store",
            local_path.display()
        );

        let remote_url = self.storage.upload_path(&local_path).await?;
        info!("Image staged at {}", remote_url);
        Ok(remote_url)
    }
}

fn is_loopback_host(url: &reqwest::Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

/// Shared header lines for both copywriter prompts.
fn copy_brief_lines(
    title: &str,
    industry: Option<&str>,
    features: Option<&[String]>,
    language: Language,
) -> Vec<String> {
    let mut lines = vec![match language {
        Language::Tr => format!("Ürün başlığı: {}", title),
        Language::En => format!("Product title: {}", title),
    }];

    if let Some(industry) = industry {
        lines.push(match language {
            Language::Tr => format!("Sektör: {}", industry),
            Language::En => format!("Industry: {}", industry),
        });
    }

    if let Some(features) = features.filter(|f| !f.is_empty()) {
        let joined = features.join(", ");
        lines.push(match language {
            Language::Tr => format!("Özellikler: {}", joined),
            Language::En => format!("Features: {}", joined),
        });
    }

    lines
}

fn description_output_line(language: Language, tone: Tone) -> String {
    match (language, tone) {
        (Language::Tr, Tone::Concise) => "İstenen çıktı: 2-3 cümle kısa tanıtım".to_string(),
        (Language::Tr, Tone::Detailed) => "İstenen çıktı: 4-6 cümle detaylı tanıtım".to_string(),
        (Language::En, Tone::Concise) => {
            "Requested output: 2-3 sentence short description".to_string()
        }
        (Language::En, Tone::Detailed) => {
            "Requested output: 4-6 sentence detailed description".to_string()
        }
    }
}

fn kit_caption_rules(language: Language, tone: Tone) -> (&'static str, &'static str) {
    match (language, tone) {
        (Language::Tr, Tone::Concise) => ("2-3 cümle", "1-2 cümle enerjik"),
        (Language::Tr, Tone::Detailed) => ("4-5 cümle", "2-3 cümle enerjik"),
        (Language::En, Tone::Concise) => ("2-3 sentences", "1-2 energetic sentences"),
        (Language::En, Tone::Detailed) => ("4-5 sentences", "2-3 energetic sentences"),
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fal::{MockBackgroundClient, MockTextClient, MockVisionClient};
    use crate::models::{KitCaptions, MarketingKit, PromptOrigin};
    use crate::storage::MockStorageClient;
    use crate::synth::DEFAULT_BACKGROUNDS;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const COPY_MODEL: &str = "openai/gpt-4o-mini";

    struct Mocks {
        text: MockTextClient,
        vision: MockVisionClient,
        background: MockBackgroundClient,
        storage: MockStorageClient,
    }

    fn build_app(mocks: Mocks, uploads_dir: PathBuf) -> App {
        App::with_services(
            AppServices {
                text: Arc::new(mocks.text),
                vision: Box::new(mocks.vision),
                background: Box::new(mocks.background),
                storage: Box::new(mocks.storage),
            },
            COPY_MODEL.to_string(),
            uploads_dir,
        )
        .with_prompt_seed(7)
    }

    fn default_mocks() -> Mocks {
        Mocks {
            text: MockTextClient::new(),
            vision: MockVisionClient::new(),
            background: MockBackgroundClient::new(),
            storage: MockStorageClient::new(),
        }
    }

    fn sample_categories() -> CategorySet {
        CategorySet {
            main_product_type: "Footwear".to_string(),
            subcategory: "Sneakers".to_string(),
            target_audience: "Unisex".to_string(),
            price_range: "Mid-range".to_string(),
            use_case: "Daily Use".to_string(),
            style_design: "Streetwear".to_string(),
            season_occasion: "All Season".to_string(),
            industrial_type: "Footwear Manufacturing".to_string(),
            vibe: "Energetic".to_string(),
        }
    }

    fn generate_request(url: &str, prompt: Option<&str>) -> GenerateRequest {
        GenerateRequest {
            input_image_url: url.to_string(),
            prompt: prompt.map(str::to_string),
            remove_bg: true,
            categories: None,
        }
    }

    fn staged_upload(dir: &std::path::Path, name: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(b"jpeg bytes").unwrap();
    }

    #[tokio::test]
    async fn test_generate_background_with_custom_prompt() {
        let mut mocks = default_mocks();
        mocks.text = MockTextClient::new().with_output("soft oak table, warm light");
        mocks.background =
            MockBackgroundClient::new().with_image("https://fal.media/out.jpg", 1024, 768);
        let probe = mocks.background.clone();

        let app = build_app(mocks, PathBuf::from("uploads"));
        let result = app
            .generate_background(generate_request(
                "https://example.com/mug.jpg",
                Some("on a wooden table"),
            ))
            .await
            .unwrap();

        assert_eq!(result.result_url, "https://fal.media/out.jpg");
        assert_eq!((result.width, result.height), (1024, 768));
        assert_eq!(result.used_prompt.origin, PromptOrigin::Custom);

        let call = probe.last_call().unwrap();
        assert_eq!(call.image_url, "https://example.com/mug.jpg");
        assert_eq!(call.prompt, "soft oak table, warm light");
        assert!(call.remove_background);
    }

    #[tokio::test]
    async fn test_generate_background_localizes_loopback_reference() {
        let dir = tempfile::tempdir().unwrap();
        staged_upload(dir.path(), "a.jpg");

        let mut mocks = default_mocks();
        mocks.storage =
            MockStorageClient::new().with_base_url("https://store.test".to_string());
        let storage_probe = mocks.storage.clone();
        let background_probe = mocks.background.clone();

        let app = build_app(mocks, dir.path().to_path_buf());
        app.generate_background(generate_request(
            "http://localhost:3000/uploads/a.jpg",
            None,
        ))
        .await
        .unwrap();

        assert_eq!(storage_probe.get_upload_count(), 1);
        let call = background_probe.last_call().unwrap();
        assert!(call.image_url.starts_with("https://store.test/uploads/"));
    }

    #[tokio::test]
    async fn test_generate_background_upload_failure_maps_to_upload_failed() {
        let dir = tempfile::tempdir().unwrap();
        staged_upload(dir.path(), "a.jpg");

        let mut mocks = default_mocks();
        mocks.storage = MockStorageClient::new().with_failure("disk full");
        let background_probe = mocks.background.clone();

        let app = build_app(mocks, dir.path().to_path_buf());
        let err = app
            .generate_background(generate_request("http://127.0.0.1:3000/uploads/a.jpg", None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UploadFailed(ref d) if d == "disk full"));
        // The pipeline stopped before generation.
        assert_eq!(background_probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_background_no_output_passes_through() {
        let mut mocks = default_mocks();
        mocks.background = MockBackgroundClient::new().with_no_output();

        let app = build_app(mocks, PathBuf::from("uploads"));
        let err = app
            .generate_background(generate_request("https://example.com/mug.jpg", None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoOutput));
    }

    #[tokio::test]
    async fn test_analyze_product_uploads_before_analysis() {
        let dir = tempfile::tempdir().unwrap();
        staged_upload(dir.path(), "shoe.png");

        let mut mocks = default_mocks();
        mocks.vision = MockVisionClient::new().with_categories(sample_categories());
        mocks.storage =
            MockStorageClient::new().with_base_url("https://store.test".to_string());
        let vision_probe = mocks.vision.clone();

        let app = build_app(mocks, dir.path().to_path_buf());
        let categories = app
            .analyze_product(AnalyzeRequest {
                image_url: "http://localhost:3000/uploads/shoe.png".to_string(),
                model: "google/gemini-2.5-flash".to_string(),
                temperature: 0.3,
            })
            .await
            .unwrap();

        assert_eq!(categories.main_product_type, "Footwear");
        let analyzed = vision_probe.last_image_url().unwrap();
        assert!(analyzed.starts_with("https://store.test/uploads/"));
        assert!(analyzed.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_analyze_product_remote_url_is_not_staged() {
        let mut mocks = default_mocks();
        mocks.vision = MockVisionClient::new().with_categories(sample_categories());
        let storage_probe = mocks.storage.clone();
        let vision_probe = mocks.vision.clone();

        let app = build_app(mocks, PathBuf::from("uploads"));
        app.analyze_product(AnalyzeRequest {
            image_url: "https://cdn.example.com/shoe.jpg".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            temperature: 0.3,
        })
        .await
        .unwrap();

        assert_eq!(storage_probe.get_upload_count(), 0);
        assert_eq!(
            vision_probe.last_image_url().as_deref(),
            Some("https://cdn.example.com/shoe.jpg")
        );
    }

    #[tokio::test]
    async fn test_generate_description_builds_brief() {
        let mut mocks = default_mocks();
        mocks.text = MockTextClient::new().with_output("A sturdy mug for daily coffee.");
        let probe = mocks.text.clone();

        let app = build_app(mocks, PathBuf::from("uploads"));
        let response = app
            .generate_description(DescriptionRequest {
                title: "Ergonomic mug".to_string(),
                features: Some(vec!["dishwasher safe".to_string(), "large handle".to_string()]),
                industry: Some("housewares".to_string()),
                tone: Tone::Concise,
                language: Language::En,
                max_tokens: 120,
                temperature: 0.7,
            })
            .await
            .unwrap();

        assert_eq!(response.description, "A sturdy mug for daily coffee.");
        assert_eq!(response.model, COPY_MODEL);
        assert_eq!(response.meta.max_tokens, 120);

        let sent = probe.last_prompt().unwrap();
        assert!(sent.contains("Product title: Ergonomic mug"));
        assert!(sent.contains("Industry: housewares"));
        assert!(sent.contains("Features: dishwasher safe, large handle"));
        assert!(sent.contains("Requested output: 2-3 sentence short description"));
    }

    #[tokio::test]
    async fn test_generate_marketing_kit_happy_path() {
        let kit_json = serde_json::to_string(&MarketingKit {
            tagline: "Brew better".to_string(),
            bullets: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            hashtags: vec!["#mug".to_string(); 6],
            captions: KitCaptions {
                ig: "ig".to_string(),
                tt: "tt".to_string(),
            },
            alt_text: "A mug".to_string(),
        })
        .unwrap();

        let mut mocks = default_mocks();
        mocks.text = MockTextClient::new()
            .with_output(&format!("Here is your kit:\n{}\nEnjoy!", kit_json));

        let app = build_app(mocks, PathBuf::from("uploads"));
        let response = app
            .generate_marketing_kit(KitRequest {
                title: "Ergonomic mug".to_string(),
                features: None,
                industry: None,
                tone: Tone::Concise,
                language: Language::En,
                max_tokens: 300,
                temperature: 0.7,
            })
            .await
            .unwrap();

        assert_eq!(response.kit.tagline, "Brew better");
        assert_eq!(response.kit.bullets.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_marketing_kit_rejects_incomplete_kit() {
        let mut mocks = default_mocks();
        mocks.text = MockTextClient::new().with_output(
            r##"{"tagline": "x", "bullets": ["a"], "hashtags": ["#a"],
                "captions": {"ig": "i", "tt": "t"}, "altText": "alt"}"##,
        );

        let app = build_app(mocks, PathBuf::from("uploads"));
        let err = app
            .generate_marketing_kit(KitRequest {
                title: "Mug".to_string(),
                features: None,
                industry: None,
                tone: Tone::Concise,
                language: Language::En,
                max_tokens: 300,
                temperature: 0.7,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LlmFailed(_)));
    }

    #[tokio::test]
    async fn test_blank_prompt_resolves_from_default_pool() {
        let mocks = default_mocks();
        let text_probe = mocks.text.clone();
        let background_probe = mocks.background.clone();

        let app = build_app(mocks, PathBuf::from("uploads"));
        let result = app
            .generate_background(generate_request("https://example.com/mug.jpg", Some("")))
            .await
            .unwrap();

        assert_eq!(result.used_prompt.origin, PromptOrigin::Default);
        assert!(DEFAULT_BACKGROUNDS.contains(&result.used_prompt.text.as_str()));
        assert_eq!(text_probe.get_call_count(), 0);
        assert_eq!(
            background_probe.last_call().unwrap().prompt,
            result.used_prompt.text
        );
    }
}
