//! Provider configuration
//!
//! Hosts hand the provider a loosely-typed options object; [`ProviderOptions::validate`]
//! turns it into a [`ProviderConfig`] or reports every required field that is missing.

use crate::models::UploadOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Raw provider options as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderOptions {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub url_endpoint: Option<String>,
    /// Upload files as private and serve them through signed URLs.
    pub restrict_unsigned_urls: Option<bool>,
    /// Defaults applied to every upload, overridable per call.
    pub upload_options: UploadOptions,
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
    pub restrict_unsigned_urls: bool,
    pub upload_options: UploadOptions,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProviderOptions {
    /// Reads options from `IMAGEKIT_*` environment variables (and `.env`).
    ///
    /// Missing variables are left unset so that [`validate`](Self::validate)
    /// can report them together.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let restrict_unsigned_urls = std::env::var("IMAGEKIT_RESTRICT_UNSIGNED_URLS")
            .ok()
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Self {
            public_key: std::env::var("IMAGEKIT_PUBLIC_KEY").ok(),
            private_key: std::env::var("IMAGEKIT_PRIVATE_KEY").ok(),
            url_endpoint: std::env::var("IMAGEKIT_URL_ENDPOINT").ok(),
            restrict_unsigned_urls,
            upload_options: UploadOptions {
                folder: std::env::var("IMAGEKIT_FOLDER").ok(),
                ..Default::default()
            },
        }
    }

    pub fn validate(self) -> Result<ProviderConfig> {
        let public_key = present(self.public_key);
        let private_key = present(self.private_key);
        let url_endpoint = present(self.url_endpoint);

        match (public_key, private_key, url_endpoint) {
            (Some(public_key), Some(private_key), Some(url_endpoint)) => Ok(ProviderConfig {
                public_key,
                private_key,
                url_endpoint,
                restrict_unsigned_urls: self.restrict_unsigned_urls.unwrap_or(false),
                upload_options: self.upload_options,
            }),
            (public_key, private_key, url_endpoint) => {
                let missing = [
                    ("publicKey", public_key.is_none()),
                    ("privateKey", private_key.is_none()),
                    ("urlEndpoint", url_endpoint.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();
                Err(Error::Configuration(missing))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full() -> ProviderOptions {
        ProviderOptions {
            public_key: Some("public_test".to_string()),
            private_key: Some("private_test".to_string()),
            url_endpoint: Some("https://ik.imagekit.io/demo".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_complete_options() {
        let config = full().validate().unwrap();
        assert_eq!(config.public_key, "public_test");
        assert!(!config.restrict_unsigned_urls);
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = ProviderOptions::default().validate().unwrap_err();
        match err {
            Error::Configuration(missing) => {
                assert_eq!(missing, vec!["publicKey", "privateKey", "urlEndpoint"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_treats_blank_as_missing() {
        let options = ProviderOptions {
            private_key: Some("   ".to_string()),
            url_endpoint: None,
            ..full()
        };

        let message = options.validate().unwrap_err().to_string();
        assert!(message.contains("privateKey"));
        assert!(message.contains("urlEndpoint"));
        assert!(!message.contains("publicKey"));
    }

    #[test]
    fn test_options_deserialize_from_host_json() {
        let options: ProviderOptions = serde_json::from_value(serde_json::json!({
            "publicKey": "pk",
            "privateKey": "sk",
            "urlEndpoint": "https://ik.imagekit.io/demo",
            "restrictUnsignedUrls": true,
            "uploadOptions": { "folder": "cms", "ignoreHostFolders": true }
        }))
        .unwrap();

        let config = options.validate().unwrap();
        assert!(config.restrict_unsigned_urls);
        assert_eq!(config.upload_options.folder.as_deref(), Some("cms"));
        assert_eq!(config.upload_options.ignore_host_folders, Some(true));
    }
}
