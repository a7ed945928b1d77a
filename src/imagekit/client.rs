use super::ImageKitService;
use crate::config::ProviderConfig;
use crate::models::{FileDetails, FileSource, UploadParams, UploadResponse, UrlOptions};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const DEFAULT_UPLOAD_BASE_URL: &str = "https://upload.imagekit.io";
const DEFAULT_API_BASE_URL: &str = "https://api.imagekit.io";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// REST client for one ImageKit account.
///
/// All requests authenticate with HTTP Basic auth, using the private key as
/// the username and an empty password.
pub struct ImageKitClient {
    client: Client,
    public_key: String,
    private_key: String,
    url_endpoint: String,
    upload_base_url: String,
    api_base_url: String,
}

impl ImageKitClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: &ProviderConfig, client: Client) -> Self {
        Self {
            client,
            public_key: config.public_key.clone(),
            private_key: config.private_key.clone(),
            url_endpoint: config.url_endpoint.clone(),
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_upload_base_url(mut self, base_url: String) -> Self {
        self.upload_base_url = base_url;
        self
    }

    pub fn with_api_base_url(mut self, base_url: String) -> Self {
        self.api_base_url = base_url;
        self
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    async fn ensure_success(response: Response, action: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        tracing::error!("ImageKit {} failed (status {}): {}", action, status, message);
        Err(Error::ImageKit(format!(
            "{} failed (status {}): {}",
            action, status, message
        )))
    }

    async fn parse<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse ImageKit {} response: {}\nBody: {}", action, e, body);
            Error::ImageKit(format!("Failed to parse {} response: {}", action, e))
        })
    }
}

#[async_trait]
impl ImageKitService for ImageKitClient {
    async fn upload(
        &self,
        content: FileSource,
        file_name: &str,
        params: &UploadParams,
    ) -> Result<UploadResponse> {
        let part = match content {
            FileSource::Buffer(bytes) => Part::bytes(bytes.to_vec()),
            FileSource::Stream(stream) => Part::stream(Body::wrap_stream(stream)),
        }
        .file_name(file_name.to_string());

        let mut form = Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string());
        for (key, value) in params.form_fields()? {
            form = form.text(key, value);
        }

        tracing::debug!("Uploading {} to ImageKit", file_name);

        let url = format!("{}/api/v1/files/upload", self.upload_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request to ImageKit: {}", e);
                e
            })?;

        let response = Self::ensure_success(response, "upload").await?;
        Self::parse(response, "upload").await
    }

    async fn get_file_details(&self, file_id: &str) -> Result<Option<FileDetails>> {
        let url = format!("{}/v1/files/{}/details", self.api_base_url, file_id);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::ensure_success(response, "file details").await?;
        Ok(Some(Self::parse(response, "file details").await?))
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let url = format!("{}/v1/files/{}", self.api_base_url, file_id);
        let response = self
            .client
            .delete(&url)
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send delete request to ImageKit: {}", e);
                e
            })?;

        Self::ensure_success(response, "delete").await?;
        Ok(())
    }

    fn url(&self, options: &UrlOptions) -> Result<String> {
        super::url::build_url(
            &self.url_endpoint,
            &self.private_key,
            options,
            chrono::Utc::now().timestamp(),
        )
    }
}
