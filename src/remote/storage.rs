use crate::{PinMapError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Opaque image-upload seam for the pin-creation flow.
///
/// Unlike fetch and geocode failures, an upload failure propagates to the
/// caller: the image is user-intended content, so the save is aborted.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads the image bytes and returns a public URL
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// HTTP object-storage client posting to a bucket endpoint
pub struct HttpObjectStorage {
    client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpObjectStorage {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(PinMapError::Upload("empty image payload".to_string()));
        }

        let mut request = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let body: UploadResponse = response.json().await?;
        Ok(body.url)
    }
}
