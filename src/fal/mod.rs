//! Inference capability clients
//!
//! Adapters over the FAL synchronous inference API: text completion,
//! multimodal vision analysis, and image-to-image background generation.
//! Each client owns its timeout and maps provider failures to exactly one
//! typed error, so the orchestrator never sees raw transport errors.

pub mod client;
pub mod image;
pub mod mock;
pub mod text;
pub mod vision;

pub use client::FalHttpClient;
pub use image::FalImageClient;
pub use mock::{MockBackgroundClient, MockTextClient, MockVisionClient};
pub use text::FalTextClient;
pub use vision::FalVisionClient;

use crate::models::{CategorySet, Completion};
use crate::Result;
use async_trait::async_trait;

/// Output image produced by the background generation capability.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait TextService: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        model: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<Completion>;
}

#[async_trait]
pub trait VisionService: Send + Sync {
    async fn analyze(&self, image_url: &str, model: &str, temperature: f32)
        -> Result<CategorySet>;
}

#[async_trait]
pub trait BackgroundService: Send + Sync {
    async fn generate(
        &self,
        image_url: &str,
        prompt: &str,
        remove_background: bool,
    ) -> Result<GeneratedImage>;
}
