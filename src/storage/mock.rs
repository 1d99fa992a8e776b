use super::StorageService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorageClient {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    failure: Option<String>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            failure: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Every subsequent upload fails with this detail.
    pub fn with_failure(mut self, detail: &str) -> Self {
        self.failure = Some(detail.to_string());
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }

    pub fn file_exists(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn upload_bytes(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        if let Some(detail) = &self.failure {
            return Err(Error::UploadFailed(detail.clone()));
        }

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(format!("{}/{}", self.base_url, key))
    }
}
