use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::IntegrationError;

const IMAGEKIT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads the file and returns the provider's JSON result, hosted `url` included.
    async fn upload(&self, upload: ImageUpload) -> Result<serde_json::Value, IntegrationError>;
}

#[derive(Clone)]
pub struct ImageKitClient {
    client: Client,
    private_key: String,
    upload_url: String,
}

impl ImageKitClient {
    pub fn new(private_key: impl Into<String>, upload_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            private_key: private_key.into(),
            upload_url: upload_url.unwrap_or_else(|| IMAGEKIT_UPLOAD_URL.to_string()),
        }
    }
}

#[async_trait]
impl ImageHost for ImageKitClient {
    async fn upload(&self, upload: ImageUpload) -> Result<serde_json::Value, IntegrationError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        if let Some(content_type) = &upload.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| IntegrationError::RequestFailed(e.to_string()))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("fileName", upload.file_name);

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntegrationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IntegrationError::from_response(response).await);
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| IntegrationError::ResponseParseFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_upload_returns_provider_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fileId": "f1",
                "url": "https://ik.imagekit.io/demo/banner.png"
            })))
            .mount(&server)
            .await;

        let client = ImageKitClient::new("private_key", Some(format!("{}/upload", server.uri())));
        let result = client
            .upload(ImageUpload {
                file_name: "banner.png".to_string(),
                content_type: Some("image/png".to_string()),
                bytes: vec![0x89, 0x50, 0x4e, 0x47],
            })
            .await
            .unwrap();

        assert_eq!(result["url"], "https://ik.imagekit.io/demo/banner.png");
    }
}
