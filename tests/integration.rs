use bytes::Bytes;
use imagekit_upload_provider::imagekit::{ImageKitClient, ImageKitService, MockImageKitClient};
use imagekit_upload_provider::models::{File, ProviderMetadata, SignedUrlParams, UploadOptions};
use imagekit_upload_provider::{
    Error, ImageKitProvider, ProviderConfig, ProviderOptions, UploadProvider,
};
use std::io::Write;
use tokio_util::io::ReaderStream;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "https://ik.imagekit.io/demo";

fn options(restrict_unsigned_urls: bool) -> ProviderOptions {
    ProviderOptions {
        public_key: Some("public_test".to_string()),
        private_key: Some("private_test".to_string()),
        url_endpoint: Some(ENDPOINT.to_string()),
        restrict_unsigned_urls: Some(restrict_unsigned_urls),
        upload_options: UploadOptions {
            folder: Some("cms".to_string()),
            ..Default::default()
        },
    }
}

fn http_provider(server: &MockServer, restrict_unsigned_urls: bool) -> ImageKitProvider {
    let config: ProviderConfig = options(restrict_unsigned_urls).validate().unwrap();
    let client = ImageKitClient::new(&config)
        .with_upload_base_url(server.uri())
        .with_api_base_url(server.uri());
    ImageKitProvider::with_service(config, Box::new(client))
}

#[tokio::test]
async fn test_upload_then_delete_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .and(body_string_contains("cms/2"))
        .and(body_string_contains("banner_1a2b.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "64f1c0",
            "name": "banner_1a2b.jpg",
            "url": "https://ik.imagekit.io/demo/cms/2/banner_1a2b.jpg",
            "filePath": "/cms/2/banner_1a2b.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/files/64f1c0/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "64f1c0",
            "name": "banner_1a2b.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/files/64f1c0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = http_provider(&server, false);
    let mut file = File::new("banner_1a2b", ".jpg")
        .with_buffer(Bytes::from_static(b"jpeg-bytes"))
        .with_folder_path("/2");

    provider.upload(&mut file, None).await.unwrap();

    assert_eq!(
        file.url.as_deref(),
        Some("https://ik.imagekit.io/demo/cms/2/banner_1a2b.jpg")
    );
    assert_eq!(file.file_id(), Some("64f1c0"));

    provider.delete(&file).await.unwrap();
}

#[tokio::test]
async fn test_delete_of_vanished_file_succeeds_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/files/old/details"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "The requested file does not exist."
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let file = File::new("old", ".png").with_provider_metadata(ProviderMetadata::for_file_id("old"));

    http_provider(&server, false).delete(&file).await.unwrap();
}

#[tokio::test]
async fn test_delete_failure_surfaces_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/files/f1/details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "f1"
        })))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v1/files/f1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "message": "Internal server error"
        })))
        .mount(&server)
        .await;

    let file = File::new("f1", ".png").with_provider_metadata(ProviderMetadata::for_file_id("f1"));

    let err = http_provider(&server, false).delete(&file).await.unwrap_err();
    assert!(matches!(err, Error::ImageKit(_)));
}

#[tokio::test]
async fn test_stream_upload_from_disk() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/files/upload"))
        .and(body_string_contains("contents streamed from disk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fileId": "stream-1",
            "url": "https://ik.imagekit.io/demo/cms/notes.txt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut temp = tempfile::NamedTempFile::new().unwrap();
    temp.write_all(b"contents streamed from disk").unwrap();
    let handle = tokio::fs::File::open(temp.path()).await.unwrap();

    let mut file = File::new("notes", ".txt").with_stream(ReaderStream::new(handle));

    http_provider(&server, false)
        .upload_stream(&mut file, None)
        .await
        .unwrap();

    assert_eq!(file.file_id(), Some("stream-1"));
}

#[tokio::test]
async fn test_signed_urls_follow_privacy_setting() {
    let server = MockServer::start().await;
    let file = File::new("img", ".jpg")
        .with_url(format!("{}/img.jpg", ENDPOINT))
        .with_provider_metadata(ProviderMetadata::for_file_id("img-1"));

    let public = http_provider(&server, false)
        .get_signed_url(&file, &SignedUrlParams::default())
        .await;
    assert_eq!(public.url, file.url);

    let private = http_provider(&server, true)
        .get_signed_url(&file, &SignedUrlParams::default())
        .await;
    assert_eq!(
        private.url.as_deref(),
        Some("https://ik.imagekit.io/demo/img.jpg?ik-s=a5a374558a994fcf53060c0884b55c6fd111671e")
    );

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_signing_foreign_url_falls_back() {
    let server = MockServer::start().await;
    let file = File::new("img", ".jpg")
        .with_url("https://cdn.elsewhere.test/img.jpg")
        .with_provider_metadata(ProviderMetadata::for_file_id("img-1"));

    let signed = http_provider(&server, true)
        .get_signed_url(&file, &SignedUrlParams::default())
        .await;

    assert_eq!(signed.url.as_deref(), Some("https://cdn.elsewhere.test/img.jpg"));
}

#[test]
fn test_init_reports_all_missing_fields() {
    let err = ImageKitProvider::init(ProviderOptions::default())
        .err()
        .unwrap();

    assert_eq!(
        err.to_string(),
        "Missing required configuration field(s): publicKey, privateKey, urlEndpoint"
    );
}

#[tokio::test]
async fn test_provider_usable_as_trait_object_with_mock() {
    let mock = MockImageKitClient::new().with_url_endpoint(ENDPOINT.to_string());
    let config = options(true).validate().unwrap();
    let provider: Box<dyn UploadProvider> =
        Box::new(ImageKitProvider::with_service(config, Box::new(mock.clone())));

    let mut file = File::new("avatar", ".webp").with_buffer(Bytes::from_static(b"webp"));
    provider.upload(&mut file, None).await.unwrap();

    assert!(provider.is_private());
    assert!(file.is_private_file());
    assert_eq!(
        file.url.as_deref(),
        Some("https://ik.imagekit.io/demo/cms/avatar.webp")
    );

    let signed = provider
        .get_signed_url(&file, &SignedUrlParams::default())
        .await;
    assert!(signed.url.unwrap().contains("ik-s="));

    provider.delete(&file).await.unwrap();
    let file_id = file.file_id().unwrap();
    assert!(!mock.has_file(file_id));
    assert!(mock.get_file_details(file_id).await.unwrap().is_none());
}
