//! Media storage abstraction
//!
//! Product images arrive as base64 payloads and are pushed to an external
//! object store over HTTP. The trait seam keeps the API handlers testable
//! without a live store.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use crate::shared::error::{AppError, Result};

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload image bytes, returning the public URL of the stored object.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String>;

    /// Delete a previously stored object by its public URL.
    async fn delete(&self, url: &str) -> Result<()>;
}

/// Decode a `data:image/...;base64,` payload (or a bare base64 string)
/// into raw bytes.
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>> {
    let data = match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::validation(format!("Invalid base64 image data: {e}")))
}

/// HTTP-backed media store. Uploads POST the image to `{base_url}/upload`
/// and deletes DELETE the object by URL.
pub struct HttpMediaStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl HttpMediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MediaStore for HttpMediaStore {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Media upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "Media upload failed with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid media upload response: {e}")))?;

        Ok(body.url)
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Media delete failed: {e}")))?;

        // Treat a missing object as already deleted
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::upstream(format!(
                "Media delete failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_posts_multipart_and_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://media.test/product-1.jpg"
            })))
            .mount(&server)
            .await;

        let store = HttpMediaStore::new(server.uri());
        let url = store.upload(b"hi".to_vec(), "product-1.jpg").await.unwrap();
        assert_eq!(url, "https://media.test/product-1.jpg");
    }

    #[tokio::test]
    async fn test_upload_failure_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = HttpMediaStore::new(server.uri());
        let err = store.upload(b"hi".to_vec(), "product-1.jpg").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[test]
    fn test_decode_data_url() {
        // "hi" in base64
        let bytes = decode_base64_image("data:image/png;base64,aGk=").unwrap();
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn test_decode_bare_base64() {
        let bytes = decode_base64_image("aGk=").unwrap();
        assert_eq!(bytes, b"hi");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_base64_image("not base64 at all!!!");
        assert!(err.is_err());
    }
}
