use super::ImageKitService;
use crate::models::{FileDetails, FileSource, UploadParams, UploadResponse, UrlOptions};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Upload captured by [`MockImageKitClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub file_name: String,
    pub params: UploadParams,
    pub content: Vec<u8>,
    pub streamed: bool,
}

#[derive(Clone)]
pub struct MockImageKitClient {
    files: Arc<Mutex<HashMap<String, FileDetails>>>,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    detail_count: Arc<Mutex<usize>>,
    deleted: Arc<Mutex<Vec<String>>>,
    url_calls: Arc<Mutex<Vec<UrlOptions>>>,
    url_endpoint: String,
    upload_error: Option<String>,
    delete_error: Option<String>,
    url_error: Option<String>,
}

impl MockImageKitClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            detail_count: Arc::new(Mutex::new(0)),
            deleted: Arc::new(Mutex::new(Vec::new())),
            url_calls: Arc::new(Mutex::new(Vec::new())),
            url_endpoint: "https://ik.imagekit.io/mock".to_string(),
            upload_error: None,
            delete_error: None,
            url_error: None,
        }
    }

    pub fn with_url_endpoint(mut self, url_endpoint: String) -> Self {
        self.url_endpoint = url_endpoint;
        self
    }

    pub fn with_file(self, file_id: &str) -> Self {
        self.files.lock().unwrap().insert(
            file_id.to_string(),
            FileDetails {
                file_id: file_id.to_string(),
                name: file_id.to_string(),
                file_path: None,
                url: None,
                is_private_file: None,
                file_type: None,
                size: None,
            },
        );
        self
    }

    pub fn with_upload_error(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_string());
        self
    }

    pub fn with_delete_error(mut self, message: &str) -> Self {
        self.delete_error = Some(message.to_string());
        self
    }

    pub fn with_url_error(mut self, message: &str) -> Self {
        self.url_error = Some(message.to_string());
        self
    }

    pub fn get_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_detail_count(&self) -> usize {
        *self.detail_count.lock().unwrap()
    }

    pub fn get_deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn get_url_calls(&self) -> Vec<UrlOptions> {
        self.url_calls.lock().unwrap().clone()
    }

    pub fn has_file(&self, file_id: &str) -> bool {
        self.files.lock().unwrap().contains_key(file_id)
    }

    /// Number of calls that would have reached ImageKit over the network.
    pub fn get_remote_call_count(&self) -> usize {
        self.get_upload_count() + self.get_detail_count() + self.get_deleted().len()
    }
}

impl Default for MockImageKitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageKitService for MockImageKitClient {
    async fn upload(
        &self,
        content: FileSource,
        file_name: &str,
        params: &UploadParams,
    ) -> Result<UploadResponse> {
        let streamed = content.is_stream();
        let content = match content {
            FileSource::Buffer(bytes) => bytes.to_vec(),
            FileSource::Stream(mut stream) => {
                let mut buf = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                buf
            }
        };

        self.uploads.lock().unwrap().push(RecordedUpload {
            file_name: file_name.to_string(),
            params: params.clone(),
            content,
            streamed,
        });

        if let Some(message) = &self.upload_error {
            return Err(Error::ImageKit(message.clone()));
        }

        let mut files = self.files.lock().unwrap();
        let file_id = format!("mock-file-{}", files.len() + 1);
        let file_path = match params.folder.as_deref().map(|f| f.trim_matches('/')) {
            Some(folder) if !folder.is_empty() => format!("/{}/{}", folder, file_name),
            _ => format!("/{}", file_name),
        };
        let url = format!("{}{}", self.url_endpoint, file_path);

        files.insert(
            file_id.clone(),
            FileDetails {
                file_id: file_id.clone(),
                name: file_name.to_string(),
                file_path: Some(file_path.clone()),
                url: Some(url.clone()),
                is_private_file: Some(params.is_private_file),
                file_type: None,
                size: None,
            },
        );

        Ok(UploadResponse {
            file_id,
            name: file_name.to_string(),
            url,
            thumbnail_url: None,
            file_path: Some(file_path),
            file_type: None,
            size: None,
            height: None,
            width: None,
            is_private_file: Some(params.is_private_file),
            tags: params.tags.clone(),
        })
    }

    async fn get_file_details(&self, file_id: &str) -> Result<Option<FileDetails>> {
        *self.detail_count.lock().unwrap() += 1;
        Ok(self.files.lock().unwrap().get(file_id).cloned())
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(file_id.to_string());

        if let Some(message) = &self.delete_error {
            return Err(Error::ImageKit(message.clone()));
        }

        self.files.lock().unwrap().remove(file_id);
        Ok(())
    }

    fn url(&self, options: &UrlOptions) -> Result<String> {
        self.url_calls.lock().unwrap().push(options.clone());

        if let Some(message) = &self.url_error {
            return Err(Error::Signing(message.clone()));
        }

        super::url::build_url(&self.url_endpoint, "mock-private-key", options, 0)
    }
}
