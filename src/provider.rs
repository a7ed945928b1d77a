//! Upload provider backed by ImageKit
//!
//! Implements the host's provider contract: upload a file, delete it by the
//! ImageKit id recorded at upload time, and hand out (signed) delivery URLs.

use crate::config::{ProviderConfig, ProviderOptions};
use crate::imagekit::{ImageKitClient, ImageKitService};
use crate::models::{
    File, FileSource, ProviderMetadata, SignedUrl, SignedUrlParams, UploadOptions, UrlOptions,
};
use crate::params::to_upload_params;
use crate::{Error, Result};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Operations a host framework calls on its upload provider.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Uploads the file's buffer or stream and records `url` and `provider_metadata`.
    async fn upload(&self, file: &mut File, options: Option<&UploadOptions>) -> Result<()>;

    async fn upload_stream(&self, file: &mut File, options: Option<&UploadOptions>)
        -> Result<()>;

    /// Removes the remote object. Files that were never uploaded or are
    /// already gone count as deleted.
    async fn delete(&self, file: &File) -> Result<()>;

    /// Never fails: when signing is not needed or not possible the stored URL
    /// is returned.
    async fn get_signed_url(&self, file: &File, params: &SignedUrlParams) -> SignedUrl;

    fn is_private(&self) -> bool;
}

pub struct ImageKitProvider {
    config: ProviderConfig,
    imagekit: Box<dyn ImageKitService>,
}

impl ImageKitProvider {
    /// Validates `options` and builds the ImageKit client shared by every call.
    pub fn init(options: ProviderOptions) -> Result<Self> {
        let config = options.validate().map_err(|e| {
            error!("Invalid ImageKit provider configuration: {}", e);
            e
        })?;
        let imagekit = ImageKitClient::new(&config);
        info!("ImageKit provider ready for {}", config.url_endpoint);

        Ok(Self::with_service(config, Box::new(imagekit)))
    }

    /// Build a provider around an existing service, e.g. a mock in tests.
    pub fn with_service(config: ProviderConfig, imagekit: Box<dyn ImageKitService>) -> Self {
        Self { config, imagekit }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn effective_options(&self, options: Option<&UploadOptions>) -> UploadOptions {
        match options {
            Some(overrides) => self.config.upload_options.overlay(overrides),
            None => self.config.upload_options.clone(),
        }
    }
}

#[async_trait]
impl UploadProvider for ImageKitProvider {
    async fn upload(&self, file: &mut File, options: Option<&UploadOptions>) -> Result<()> {
        // Streams are handed over as-is; buffers stay on the file.
        let content = match file.source.take() {
            Some(FileSource::Buffer(bytes)) => {
                file.source = Some(FileSource::Buffer(bytes.clone()));
                FileSource::Buffer(bytes)
            }
            Some(stream) => stream,
            None => {
                error!("Cannot upload {}: {}", file.name, Error::MissingContentSource);
                return Err(Error::MissingContentSource);
            }
        };

        let options = self.effective_options(options);
        let params = to_upload_params(&options, file, self.is_private());
        let file_name = file.remote_name();

        let response = self
            .imagekit
            .upload(content, &file_name, &params)
            .await
            .map_err(|e| {
                error!("File upload failed for {}: {}", file_name, e);
                e
            })?;

        info!("File uploaded successfully with id {}", response.file_id);

        file.url = Some(response.url);
        file.provider_metadata = Some(ProviderMetadata {
            file_id: Some(response.file_id),
            is_private_file: Some(params.is_private_file),
            file_path: response.file_path,
            ..Default::default()
        });

        Ok(())
    }

    async fn upload_stream(
        &self,
        file: &mut File,
        options: Option<&UploadOptions>,
    ) -> Result<()> {
        debug!("Uploading {} from stream", file.name);
        self.upload(file, options).await
    }

    async fn delete(&self, file: &File) -> Result<()> {
        let Some(file_id) = file.file_id() else {
            debug!("No ImageKit file id on {}, nothing to delete", file.name);
            return Ok(());
        };

        let details = self.imagekit.get_file_details(file_id).await.map_err(|e| {
            error!("Could not look up file with ID {}: {}", file_id, e);
            e
        })?;

        if details.is_none() {
            info!("File with ID {} no longer exists on ImageKit", file_id);
            return Ok(());
        }

        self.imagekit.delete_file(file_id).await.map_err(|e| {
            error!("Error deleting file with ID {}: {}", file_id, e);
            e
        })?;

        info!("File with ID {} deleted successfully", file_id);
        Ok(())
    }

    async fn get_signed_url(&self, file: &File, params: &SignedUrlParams) -> SignedUrl {
        let stored = SignedUrl {
            url: file.url.clone(),
        };

        if !(self.is_private() || file.is_private_file()) {
            return stored;
        }

        let (Some(file_id), Some(src)) = (file.file_id(), file.url.as_deref()) else {
            return stored;
        };

        debug!("Generating signed URL for private file with ID {}", file_id);

        let options = UrlOptions {
            src: src.to_string(),
            signed: true,
            expire_seconds: params.expire_seconds,
            transformation: params.transformation.clone(),
            query_parameters: params.query_parameters.clone(),
        };

        match self.imagekit.url(&options) {
            Ok(url) => SignedUrl { url: Some(url) },
            Err(e) => {
                warn!("Signing failed for file {}, using stored URL: {}", file_id, e);
                stored
            }
        }
    }

    fn is_private(&self) -> bool {
        self.config.restrict_unsigned_urls
    }
}
