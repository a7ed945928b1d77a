//! ImageKit integration
//!
//! Wraps the ImageKit upload, media management and URL signing APIs behind
//! [`ImageKitService`] so the provider can be exercised against a mock.

pub mod client;
pub mod mock;
pub mod url;

pub use client::ImageKitClient;
pub use mock::MockImageKitClient;

use crate::models::{FileDetails, FileSource, UploadParams, UploadResponse, UrlOptions};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageKitService: Send + Sync {
    async fn upload(
        &self,
        content: FileSource,
        file_name: &str,
        params: &UploadParams,
    ) -> Result<UploadResponse>;

    /// Returns `None` when ImageKit has no file with this id.
    async fn get_file_details(&self, file_id: &str) -> Result<Option<FileDetails>>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;

    fn url(&self, options: &UrlOptions) -> Result<String>;
}
