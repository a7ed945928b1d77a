//! URL building and signing for ImageKit delivery URLs.
//!
//! Signed URLs carry `ik-s`, an HMAC-SHA1 (hex) of the URL relative to the
//! endpoint followed by the expiry timestamp. `ik-t` is only added when the
//! signature expires.

use crate::models::{Transformation, UrlOptions};
use crate::{Error, Result};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Expiry used in the signature when the caller asks for none.
pub const DEFAULT_EXPIRY_TIMESTAMP: i64 = 9_999_999_999;

const SIGNATURE_PARAMETER: &str = "ik-s";
const TIMESTAMP_PARAMETER: &str = "ik-t";
const TRANSFORMATION_PARAMETER: &str = "tr";

fn transformation_key(key: &str) -> &str {
    match key {
        "height" => "h",
        "width" => "w",
        "aspectRatio" => "ar",
        "quality" => "q",
        "crop" => "c",
        "cropMode" => "cm",
        "x" => "x",
        "y" => "y",
        "focus" => "fo",
        "format" => "f",
        "radius" => "r",
        "background" => "bg",
        "border" => "b",
        "rotation" => "rt",
        "blur" => "bl",
        "named" => "n",
        "progressive" => "pr",
        "lossless" => "lo",
        "trim" => "t",
        "metadata" => "md",
        "colorProfile" => "cp",
        "defaultImage" => "di",
        "dpr" => "dpr",
        "effectSharpen" => "e-sharpen",
        "effectGray" => "e-grayscale",
        "effectContrast" => "e-contrast",
        "original" => "orig",
        other => other,
    }
}

/// Serializes transformation steps into the `tr` parameter value.
///
/// Parameters within a step are joined with `,`, steps with `:`.
pub fn transformation_string(steps: &[Transformation]) -> String {
    steps
        .iter()
        .map(|step| {
            step.iter()
                .filter_map(|(key, value)| {
                    let value = match value {
                        Value::Null => return None,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    let key = transformation_key(key);
                    Some(if key == "raw" {
                        value
                    } else if value.is_empty() || value == "-" {
                        key.to_string()
                    } else {
                        format!("{}-{}", key, value)
                    })
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .filter(|step| !step.is_empty())
        .collect::<Vec<_>>()
        .join(":")
}

fn sign(private_key: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(private_key.as_bytes())
        .map_err(|e| Error::Signing(format!("Invalid signing key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn assemble(base: &str, query: &[String]) -> String {
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query.join("&"))
    }
}

/// Builds a delivery URL for `options.src`, signing it when requested.
///
/// `now` is the current unix time in seconds, used for expiring signatures.
pub fn build_url(
    url_endpoint: &str,
    private_key: &str,
    options: &UrlOptions,
    now: i64,
) -> Result<String> {
    let src = options.src.trim();
    if !(src.starts_with("https://") || src.starts_with("http://")) {
        return Err(Error::Signing(format!("Source URL is not absolute: {}", src)));
    }

    let (base, existing_query) = match src.split_once('?') {
        Some((base, query)) => (base, query),
        None => (src, ""),
    };

    let mut query: Vec<String> = existing_query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let transformation = transformation_string(&options.transformation);
    if !transformation.is_empty() {
        query.push(format!(
            "{}={}",
            TRANSFORMATION_PARAMETER,
            urlencoding::encode(&transformation)
        ));
    }

    for (key, value) in &options.query_parameters {
        query.push(format!(
            "{}={}",
            urlencoding::encode(key),
            urlencoding::encode(value)
        ));
    }

    if !options.signed {
        return Ok(assemble(base, &query));
    }

    let endpoint = format!("{}/", url_endpoint.trim_end_matches('/'));
    if !base.starts_with(&endpoint) {
        return Err(Error::Signing(format!(
            "Source URL {} is not under the configured endpoint {}",
            src, endpoint
        )));
    }

    let expiry = match options.expire_seconds {
        Some(seconds) => {
            let expiry = now.saturating_add(seconds as i64);
            query.push(format!("{}={}", TIMESTAMP_PARAMETER, expiry));
            expiry
        }
        None => DEFAULT_EXPIRY_TIMESTAMP,
    };

    let intermediate = assemble(base, &query);
    let payload = format!("{}{}", &intermediate[endpoint.len()..], expiry);
    let signature = sign(private_key, &payload)?;
    query.push(format!("{}={}", SIGNATURE_PARAMETER, signature));

    Ok(assemble(base, &query))
}
