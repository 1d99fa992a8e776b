//! Data models and structures
//!
//! Defines the wire types for the HTTP surface, the domain types shared by
//! the orchestration pipeline, and the environment-backed configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Nine-field product classification produced by the vision capability.
///
/// Immutable once obtained; lives only for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySet {
    pub main_product_type: String,
    pub subcategory: String,
    pub target_audience: String,
    pub price_range: String,
    pub use_case: String,
    pub style_design: String,
    pub season_occasion: String,
    pub industrial_type: String,
    pub vibe: String,
}

impl CategorySet {
    /// Render the categories as a `- key: value` listing for prompt text.
    pub fn as_prompt_lines(&self) -> String {
        [
            ("main_product_type", &self.main_product_type),
            ("subcategory", &self.subcategory),
            ("target_audience", &self.target_audience),
            ("price_range", &self.price_range),
            ("use_case", &self.use_case),
            ("style_design", &self.style_design),
            ("season_occasion", &self.season_occasion),
            ("industrial_type", &self.industrial_type),
            ("vibe", &self.vibe),
        ]
        .iter()
        .map(|(key, value)| format!("- {}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitCaptions {
    pub ig: String,
    pub tt: String,
}

/// Structured marketing copy for one product. Returned whole or not at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketingKit {
    pub tagline: String,
    pub bullets: Vec<String>,
    pub hashtags: Vec<String>,
    pub captions: KitCaptions,
    #[serde(rename = "altText")]
    pub alt_text: String,
}

/// Which branch of the synthesis policy produced a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOrigin {
    Custom,
    CategoryDerived,
    Default,
}

impl PromptOrigin {
    /// Preset label reported back to the caller in the generate response.
    pub fn preset(&self) -> &'static str {
        match self {
            PromptOrigin::Custom => "custom",
            PromptOrigin::CategoryDerived => "category",
            PromptOrigin::Default => "studio-soft",
        }
    }
}

/// The final prompt driving image generation. Created once per request,
/// never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    pub text: String,
    pub origin: PromptOrigin,
}

/// Successful end of the background pipeline.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub result_url: String,
    pub width: u32,
    pub height: u32,
    pub used_prompt: ResolvedPrompt,
}

/// One text-capability answer: the output plus any provider-side reasoning.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub output: String,
    pub reasoning: Option<String>,
}

// HTTP request/response wire types

fn default_true() -> bool {
    true
}

fn default_analysis_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_analysis_temperature() -> f32 {
    0.3
}

fn default_temperature() -> f32 {
    0.7
}

fn default_description_max_tokens() -> u32 {
    120
}

fn default_kit_max_tokens() -> u32 {
    300
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub input_image_url: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default = "default_true")]
    pub remove_bg: bool,
    #[serde(default)]
    pub categories: Option<CategorySet>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<()> {
        parse_http_url(&self.input_image_url, "inputImageUrl")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub preset: &'static str,
    pub result_url: String,
    pub width: u32,
    pub height: u32,
    pub used_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub image_url: String,
    #[serde(default = "default_analysis_model")]
    pub model: String,
    #[serde(default = "default_analysis_temperature")]
    pub temperature: f32,
}

impl AnalyzeRequest {
    pub fn validate(&self) -> Result<()> {
        parse_http_url(&self.image_url, "imageUrl")?;
        validate_temperature(self.temperature)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Concise,
    Detailed,
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Concise
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    En,
}

impl Default for Language {
    fn default() -> Self {
        Language::Tr
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub title: String,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_description_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl DescriptionRequest {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_max_tokens(self.max_tokens, 50, 400)?;
        validate_temperature(self.temperature)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitRequest {
    pub title: String,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_kit_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl KitRequest {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_max_tokens(self.max_tokens, 80, 400)?;
        validate_temperature(self.temperature)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyMeta {
    pub max_tokens: u32,
    pub temperature: f32,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescriptionResponse {
    pub model: String,
    pub language: Language,
    pub tone: Tone,
    pub description: String,
    pub meta: CopyMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct KitResponse {
    pub language: Language,
    pub tone: Tone,
    pub model: String,
    pub kit: MarketingKit,
    pub meta: CopyMeta,
}

fn parse_http_url(value: &str, field: &str) -> Result<reqwest::Url> {
    let url = reqwest::Url::parse(value)
        .map_err(|_| Error::Validation(format!("{} must be a valid URL", field)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Validation(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

fn validate_temperature(temperature: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&temperature) {
        return Err(Error::Validation(format!(
            "temperature must be between 0 and 1, got {}",
            temperature
        )));
    }
    Ok(())
}

fn validate_max_tokens(max_tokens: u32, min: u32, max: u32) -> Result<()> {
    if !(min..=max).contains(&max_tokens) {
        return Err(Error::Validation(format!(
            "maxTokens must be between {} and {}, got {}",
            min, max, max_tokens
        )));
    }
    Ok(())
}

// FAL API request/response models

/// Arguments for the synchronous `any-llm` text endpoints.
#[derive(Debug, Serialize)]
pub struct AnyLlmRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub priority: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AnyLlmResponse {
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub partial: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Arguments for the image-to-image background edit endpoint.
#[derive(Debug, Serialize)]
pub struct BackgroundEditRequest {
    pub prompt: String,
    pub image_urls: Vec<String>,
    pub num_images: u32,
    pub output_format: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct BackgroundEditResponse {
    #[serde(default)]
    pub images: Vec<FalImage>,
}

#[derive(Debug, Deserialize)]
pub struct FalImage {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub fal_api_key: String,
    pub fal_base_url: String,
    pub copy_model: String,
    pub storage_access_key_id: String,
    pub storage_secret_access_key: String,
    pub storage_endpoint: String,
    pub storage_bucket: String,
    pub storage_base_url: String,
    pub uploads_dir: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        // FAL_KEY is canonical; FAL_API_KEY accepted as an alias.
        let fal_api_key = std::env::var("FAL_KEY")
            .or_else(|_| std::env::var("FAL_API_KEY"))
            .map_err(|_| Error::Config("FAL_KEY not set".to_string()))?;

        Ok(Self {
            fal_api_key,
            fal_base_url: std::env::var("FAL_BASE_URL")
                .unwrap_or_else(|_| "https://fal.run".to_string()),
            copy_model: std::env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
            storage_access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| Error::Config("STORAGE_ACCESS_KEY_ID not set".to_string()))?,
            storage_secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| Error::Config("STORAGE_SECRET_ACCESS_KEY not set".to_string()))?,
            storage_endpoint: std::env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| "https://nyc3.digitaloceanspaces.com".to_string()),
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "studioshot".to_string()),
            storage_base_url: std::env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "https://cdn.studioshot.app".to_string()),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        })
    }
}
