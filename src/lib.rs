//! ImageKit upload provider for content-management hosts
//!
//! Forwards uploaded files to ImageKit, records the remote file id on the
//! host's file record, and supports deletion and signed delivery URLs.

pub mod config;
pub mod error;
pub mod imagekit;
pub mod models;
pub mod params;
pub mod provider;

pub use config::{ProviderConfig, ProviderOptions};
pub use error::{Error, Result};
pub use provider::{ImageKitProvider, UploadProvider};
