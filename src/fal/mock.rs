use super::{BackgroundService, GeneratedImage, TextService, VisionService};
use crate::models::{CategorySet, Completion};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Queued text completions; cycles when exhausted, like the real endpoint
/// would keep answering.
#[derive(Clone)]
pub struct MockTextClient {
    responses: Arc<Mutex<Vec<std::result::Result<Completion, String>>>>,
    call_count: Arc<Mutex<usize>>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockTextClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_output(self, output: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(Completion {
            output: output.to_string(),
            reasoning: None,
        }));
        self
    }

    pub fn with_completion(self, completion: Completion) -> Self {
        self.responses.lock().unwrap().push(Ok(completion));
        self
    }

    pub fn with_failure(self, detail: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(detail.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Default for MockTextClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextService for MockTextClient {
    async fn complete(
        &self,
        prompt: &str,
        _system: Option<&str>,
        _model: &str,
        _temperature: f32,
        _max_tokens: Option<u32>,
    ) -> Result<Completion> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(Completion {
                output: format!("mock completion for: {}", prompt),
                reasoning: None,
            });
        }
        let index = (*count - 1) % responses.len();
        match &responses[index] {
            Ok(completion) => Ok(completion.clone()),
            Err(detail) => Err(Error::LlmFailed(detail.clone())),
        }
    }
}

#[derive(Clone)]
pub struct MockVisionClient {
    responses: Arc<Mutex<Vec<std::result::Result<CategorySet, String>>>>,
    call_count: Arc<Mutex<usize>>,
    last_image_url: Arc<Mutex<Option<String>>>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_image_url: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_categories(self, categories: CategorySet) -> Self {
        self.responses.lock().unwrap().push(Ok(categories));
        self
    }

    pub fn with_failure(self, detail: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(detail.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_image_url(&self) -> Option<String> {
        self.last_image_url.lock().unwrap().clone()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionService for MockVisionClient {
    async fn analyze(
        &self,
        image_url: &str,
        _model: &str,
        _temperature: f32,
    ) -> Result<CategorySet> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        *self.last_image_url.lock().unwrap() = Some(image_url.to_string());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::AnalysisFailed("no mock categories queued".to_string()));
        }
        let index = (*count - 1) % responses.len();
        match &responses[index] {
            Ok(categories) => Ok(categories.clone()),
            Err(detail) => Err(Error::AnalysisFailed(detail.clone())),
        }
    }
}

/// Arguments captured from the most recent background generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundCall {
    pub image_url: String,
    pub prompt: String,
    pub remove_background: bool,
}

#[derive(Clone)]
pub struct MockBackgroundClient {
    responses: Arc<Mutex<Vec<std::result::Result<GeneratedImage, MockBackgroundFailure>>>>,
    call_count: Arc<Mutex<usize>>,
    last_call: Arc<Mutex<Option<BackgroundCall>>>,
}

#[derive(Clone)]
enum MockBackgroundFailure {
    Generation(String),
    NoOutput,
}

impl MockBackgroundClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_image(self, url: &str, width: u32, height: u32) -> Self {
        self.responses.lock().unwrap().push(Ok(GeneratedImage {
            url: url.to_string(),
            width,
            height,
        }));
        self
    }

    pub fn with_failure(self, detail: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(MockBackgroundFailure::Generation(detail.to_string())));
        self
    }

    pub fn with_no_output(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push(Err(MockBackgroundFailure::NoOutput));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_call(&self) -> Option<BackgroundCall> {
        self.last_call.lock().unwrap().clone()
    }
}

impl Default for MockBackgroundClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundService for MockBackgroundClient {
    async fn generate(
        &self,
        image_url: &str,
        prompt: &str,
        remove_background: bool,
    ) -> Result<GeneratedImage> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        *self.last_call.lock().unwrap() = Some(BackgroundCall {
            image_url: image_url.to_string(),
            prompt: prompt.to_string(),
            remove_background,
        });

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Ok(GeneratedImage {
                url: "https://mock-fal.example.com/result.jpg".to_string(),
                width: 1024,
                height: 1024,
            });
        }
        let index = (*count - 1) % responses.len();
        match &responses[index] {
            Ok(image) => Ok(image.clone()),
            Err(MockBackgroundFailure::Generation(detail)) => {
                Err(Error::GenerationFailed(detail.clone()))
            }
            Err(MockBackgroundFailure::NoOutput) => Err(Error::NoOutput),
        }
    }
}
