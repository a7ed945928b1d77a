//! Data models and structures
//!
//! Defines the host-facing file record, the upload option/parameter shapes,
//! and the request/response payloads exchanged with the ImageKit API.

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

/// Byte stream accepted as an upload source.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

/// One ImageKit transformation step, e.g. `{"width": 300, "height": 200}`.
pub type Transformation = BTreeMap<String, Value>;

/// Where the bytes of a file come from. A file carries at most one.
pub enum FileSource {
    Buffer(Bytes),
    Stream(ByteStream),
}

impl FileSource {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static,
    {
        FileSource::Stream(Box::pin(stream))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, FileSource::Stream(_))
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            FileSource::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// File record owned by the host framework.
///
/// The provider reads the naming fields and the source, and writes `url` and
/// `provider_metadata` back after a successful upload.
#[derive(Debug, Default)]
pub struct File {
    pub name: String,
    pub hash: String,
    pub ext: String,
    pub mime: Option<String>,
    pub size: Option<u64>,
    /// Host-side folder path, e.g. `"/1/4"`.
    pub folder_path: Option<String>,
    pub url: Option<String>,
    pub provider_metadata: Option<ProviderMetadata>,
    pub source: Option<FileSource>,
}

impl File {
    pub fn new(hash: impl Into<String>, ext: impl Into<String>) -> Self {
        let hash = hash.into();
        let ext = ext.into();
        Self {
            name: format!("{}{}", hash, ext),
            hash,
            ext,
            ..Default::default()
        }
    }

    pub fn with_buffer(mut self, buffer: impl Into<Bytes>) -> Self {
        self.source = Some(FileSource::Buffer(buffer.into()));
        self
    }

    pub fn with_stream<S>(mut self, stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static,
    {
        self.source = Some(FileSource::from_stream(stream));
        self
    }

    pub fn with_folder_path(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = Some(folder_path.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_provider_metadata(mut self, metadata: ProviderMetadata) -> Self {
        self.provider_metadata = Some(metadata);
        self
    }

    /// Object name used on the ImageKit side: `hash` followed by `ext`.
    pub fn remote_name(&self) -> String {
        format!("{}{}", self.hash, self.ext)
    }

    pub fn file_id(&self) -> Option<&str> {
        self.provider_metadata
            .as_ref()
            .and_then(|m| m.file_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_private_file(&self) -> bool {
        self.provider_metadata
            .as_ref()
            .and_then(|m| m.is_private_file)
            .unwrap_or(false)
    }
}

/// Provider fields persisted by the host alongside the file record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private_file: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProviderMetadata {
    pub fn for_file_id(file_id: impl Into<String>) -> Self {
        Self {
            file_id: Some(file_id.into()),
            ..Default::default()
        }
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.is_private_file = Some(is_private);
        self
    }
}

/// Upload options as supplied by the host configuration or a single call.
///
/// Keys outside the known set are collected in `unrecognized` and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(rename = "overwriteAITags", skip_serializing_if = "Option::is_none")]
    pub overwrite_ai_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_custom_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<String>,
    /// Base folder on ImageKit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// When true, the host's own folder path is not appended to `folder`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_host_folders: Option<bool>,
    #[serde(flatten)]
    pub unrecognized: Map<String, Value>,
}

impl UploadOptions {
    /// Returns these options with every value present in `overrides` replacing ours.
    pub fn overlay(&self, overrides: &UploadOptions) -> UploadOptions {
        let mut unrecognized = self.unrecognized.clone();
        unrecognized.extend(overrides.unrecognized.clone());

        UploadOptions {
            tags: overrides.tags.clone().or_else(|| self.tags.clone()),
            custom_coordinates: overrides
                .custom_coordinates
                .clone()
                .or_else(|| self.custom_coordinates.clone()),
            extensions: overrides
                .extensions
                .clone()
                .or_else(|| self.extensions.clone()),
            webhook_url: overrides
                .webhook_url
                .clone()
                .or_else(|| self.webhook_url.clone()),
            overwrite_ai_tags: overrides.overwrite_ai_tags.or(self.overwrite_ai_tags),
            overwrite_tags: overrides.overwrite_tags.or(self.overwrite_tags),
            overwrite_custom_metadata: overrides
                .overwrite_custom_metadata
                .or(self.overwrite_custom_metadata),
            custom_metadata: overrides
                .custom_metadata
                .clone()
                .or_else(|| self.custom_metadata.clone()),
            transformation: overrides
                .transformation
                .clone()
                .or_else(|| self.transformation.clone()),
            checks: overrides.checks.clone().or_else(|| self.checks.clone()),
            folder: overrides.folder.clone().or_else(|| self.folder.clone()),
            ignore_host_folders: overrides.ignore_host_folders.or(self.ignore_host_folders),
            unrecognized,
        }
    }
}

/// Validated parameter set sent with an upload request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(rename = "overwriteAITags", skip_serializing_if = "Option::is_none")]
    pub overwrite_ai_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_custom_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub use_unique_file_name: bool,
    pub is_private_file: bool,
}

impl UploadParams {
    /// Flattens the parameters into multipart text fields.
    ///
    /// ImageKit takes `tags` as a comma-separated list and structured values
    /// (extensions, metadata, transformation) as JSON text.
    pub fn form_fields(&self) -> crate::Result<Vec<(String, String)>> {
        let Value::Object(map) = serde_json::to_value(self)? else {
            return Ok(Vec::new());
        };

        Ok(map
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Array(items) if key == "tags" => items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(","),
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect())
    }
}

/// Response body of the upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub is_private_file: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Subset of the file-details response the provider relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub file_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_private_file: Option<bool>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Input to the URL builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlOptions {
    /// Absolute URL under the configured endpoint.
    pub src: String,
    pub signed: bool,
    /// Signature lifetime; unset means the signature does not expire.
    pub expire_seconds: Option<u64>,
    pub transformation: Vec<Transformation>,
    pub query_parameters: BTreeMap<String, String>,
}

/// Caller-supplied extras for signed URL generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignedUrlParams {
    pub transformation: Vec<Transformation>,
    pub expire_seconds: Option<u64>,
    pub query_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedUrl {
    pub url: Option<String>,
}
