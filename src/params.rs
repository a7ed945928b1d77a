//! Upload parameter filtering
//!
//! Pure translation from host upload options to the parameter set ImageKit
//! receives. Nothing here performs I/O.

use crate::models::{File, UploadOptions, UploadParams};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim_matches('/').trim().is_empty())
}

/// Chooses the destination folder for an upload.
///
/// `base` comes first and `file_folder` is appended unless `ignore_file_folder`
/// is set. Either side alone wins by itself.
pub fn resolve_folder(
    base: Option<&str>,
    file_folder: Option<&str>,
    ignore_file_folder: bool,
) -> Option<String> {
    let file_folder = if ignore_file_folder {
        None
    } else {
        non_empty(file_folder)
    };

    match (non_empty(base), file_folder) {
        (Some(base), Some(path)) => Some(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )),
        (Some(base), None) => Some(base.to_string()),
        (None, Some(path)) => Some(path.to_string()),
        (None, None) => None,
    }
}

/// Builds the parameters for uploading `file`.
///
/// Only allow-listed options survive. `useUniqueFileName` is always false since
/// the object name is already derived from the file hash, and `isPrivateFile`
/// always follows the provider setting.
pub fn to_upload_params(options: &UploadOptions, file: &File, is_private: bool) -> UploadParams {
    if !options.unrecognized.is_empty() {
        tracing::debug!(
            "Dropping unsupported upload options: {:?}",
            options.unrecognized.keys().collect::<Vec<_>>()
        );
    }

    UploadParams {
        tags: options.tags.clone().filter(|tags| !tags.is_empty()),
        custom_coordinates: options.custom_coordinates.clone(),
        extensions: options.extensions.clone(),
        webhook_url: options.webhook_url.clone(),
        overwrite_ai_tags: options.overwrite_ai_tags,
        overwrite_tags: options.overwrite_tags,
        overwrite_custom_metadata: options.overwrite_custom_metadata,
        custom_metadata: options.custom_metadata.clone(),
        transformation: options.transformation.clone().filter(|t| !t.is_null()),
        checks: options.checks.clone(),
        folder: resolve_folder(
            options.folder.as_deref(),
            file.folder_path.as_deref(),
            options.ignore_host_folders.unwrap_or(false),
        ),
        use_unique_file_name: false,
        is_private_file: is_private,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    #[test]
    fn test_folder_merges_base_and_file_path() {
        assert_eq!(resolve_folder(Some("a"), Some("b"), false).as_deref(), Some("a/b"));
    }

    #[test]
    fn test_folder_merge_disabled_keeps_base() {
        assert_eq!(resolve_folder(Some("a"), Some("b"), true).as_deref(), Some("a"));
    }

    #[test]
    fn test_folder_without_base_uses_file_path() {
        assert_eq!(resolve_folder(None, Some("b"), false).as_deref(), Some("b"));
    }

    #[test]
    fn test_folder_absent_when_neither_present() {
        assert_eq!(resolve_folder(None, None, false), None);
        assert_eq!(resolve_folder(Some(""), Some("/"), false), None);
    }

    #[test]
    fn test_folder_join_normalizes_slashes() {
        assert_eq!(
            resolve_folder(Some("/media/"), Some("/1/4"), false).as_deref(),
            Some("/media/1/4")
        );
    }

    #[test]
    fn test_params_keep_only_allowed_non_null_keys() {
        let options: UploadOptions = serde_json::from_value(serde_json::json!({
            "tags": ["cms"],
            "checks": "\"file.size\" < \"1mb\"",
            "webhookUrl": null,
            "useUniqueFileName": true,
            "isPrivateFile": true,
            "responseFields": "tags",
            "folder": "uploads"
        }))
        .unwrap();
        let file = File::new("hash", ".jpg").with_folder_path("/2");

        let params = to_upload_params(&options, &file, false);
        let keys: BTreeSet<String> = params
            .form_fields()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        let expected: BTreeSet<String> = [
            "tags",
            "checks",
            "folder",
            "useUniqueFileName",
            "isPrivateFile",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(keys, expected);
        assert_eq!(params.folder.as_deref(), Some("uploads/2"));
        assert!(!params.use_unique_file_name);
        assert!(!params.is_private_file);
    }

    #[test]
    fn test_params_force_private_flag_from_provider() {
        let options = UploadOptions::default();
        let file = File::new("hash", ".png");

        let params = to_upload_params(&options, &file, true);
        assert!(params.is_private_file);
        assert_eq!(params.folder, None);
    }
}
