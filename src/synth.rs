//! Prompt synthesis for background generation
//!
//! Exactly one prompt comes out of every request, resolved by strict
//! priority: a non-blank user prompt (refined through the text capability)
//! beats detected categories (turned into a templated prompt), which beat
//! the static default pool. Every capability failure inside this module
//! degrades to the next tier; nothing propagates.

use crate::fal::TextService;
use crate::models::{CategorySet, PromptOrigin, ResolvedPrompt};
use crate::{prompts, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Hand-authored studio backdrop descriptions used when nothing better is
/// available.
pub const DEFAULT_BACKGROUNDS: [&str; 5] = [
    "soft key light, seamless white studio backdrop, premium e-commerce look, product centered, subtle shadow",
    "minimalist gray background, professional studio lighting, clean product photography",
    "warm beige studio background, soft diffused lighting, elegant product display",
    "modern white backdrop, high-key lighting, crisp shadows, commercial photography",
    "neutral cream background, natural light simulation, professional product shot",
];

/// Style directive passed to the category prompt builder.
pub const CATEGORY_STYLE_DIRECTIVE: &str =
    "professional e-commerce photography, premium aesthetic";

const REFINE_TEMPERATURE: f32 = 0.7;
const REFINE_MAX_TOKENS: u32 = 100;

pub struct PromptSynthesizer {
    text: Arc<dyn TextService>,
    model: String,
    rng: Mutex<StdRng>,
}

impl PromptSynthesizer {
    pub fn new(text: Arc<dyn TextService>, model: String) -> Self {
        Self {
            text,
            model,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use deterministic pool selection; for tests.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Resolve the one prompt this request will generate with.
    pub async fn resolve(
        &self,
        user_prompt: Option<&str>,
        categories: Option<&CategorySet>,
    ) -> ResolvedPrompt {
        if let Some(raw) = user_prompt.map(str::trim).filter(|p| !p.is_empty()) {
            return match self.refine(raw).await {
                Ok(refined) if !refined.is_empty() => {
                    info!("Refined user prompt: {}", refined);
                    ResolvedPrompt {
                        text: refined,
                        origin: PromptOrigin::Custom,
                    }
                }
                Ok(_) => {
                    warn!("Refinement returned empty text, using user prompt verbatim");
                    ResolvedPrompt {
                        text: raw.to_string(),
                        origin: PromptOrigin::Custom,
                    }
                }
                Err(e) => {
                    warn!("Prompt refinement failed, using user prompt verbatim: {}", e);
                    ResolvedPrompt {
                        text: raw.to_string(),
                        origin: PromptOrigin::Custom,
                    }
                }
            };
        }

        if let Some(categories) = categories {
            match self.category_prompt(categories).await {
                Ok(text) => {
                    info!("Built category-derived prompt: {}", text);
                    return ResolvedPrompt {
                        text,
                        origin: PromptOrigin::CategoryDerived,
                    };
                }
                Err(e) => {
                    warn!("Category prompt build failed, falling back to default pool: {}", e);
                    return self.pick_default();
                }
            }
        }

        self.pick_default()
    }

    async fn refine(&self, raw: &str) -> Result<String> {
        let user = prompts::render(prompts::REFINE_USER, &[("prompt", raw)]);
        let completion = self
            .text
            .complete(
                &user,
                Some(prompts::REFINE_SYSTEM),
                &self.model,
                REFINE_TEMPERATURE,
                Some(REFINE_MAX_TOKENS),
            )
            .await?;
        Ok(completion.output.trim().to_string())
    }

    async fn category_prompt(&self, categories: &CategorySet) -> Result<String> {
        let user = prompts::render(
            prompts::CATEGORY_BACKGROUND,
            &[
                ("categories", categories.as_prompt_lines().as_str()),
                ("style", CATEGORY_STYLE_DIRECTIVE),
            ],
        );
        let completion = self
            .text
            .complete(&user, None, &self.model, REFINE_TEMPERATURE, None)
            .await?;

        let text = completion.output.trim().to_string();
        if text.is_empty() {
            return Err(crate::Error::LlmFailed(
                "category prompt builder returned empty text".to_string(),
            ));
        }
        Ok(text)
    }

    fn pick_default(&self) -> ResolvedPrompt {
        let index = self
            .rng
            .lock()
            .expect("default pool rng lock")
            .gen_range(0..DEFAULT_BACKGROUNDS.len());
        let text = DEFAULT_BACKGROUNDS[index].to_string();
        info!("Using default background prompt: {}", text);
        ResolvedPrompt {
            text,
            origin: PromptOrigin::Default,
        }
    }
}
