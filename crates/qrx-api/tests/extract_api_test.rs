//! Black-box API tests against an ephemeral server with scripted backends.

use std::io::Cursor;
use std::sync::Arc;

use image::Rgb;
use qrx_api::AppState;
use qrx_core::{PageImage, Region};
use qrx_extract::{ExtractorConfig, QrExtractor};
use qrx_vision::{MockDecoder, MockDetector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(detector: MockDetector, decoder: MockDecoder) -> String {
    let extractor = Arc::new(QrExtractor::new(
        Arc::new(detector),
        Arc::new(decoder),
        ExtractorConfig::default(),
    ));
    let app = qrx_api::router(AppState::new(extractor));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let page = PageImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut buf = Vec::new();
    page.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn multipart(file_name: &str, data: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(data).file_name(file_name.to_string()),
    )
}

#[tokio::test]
async fn upload_returns_extraction_report() {
    let detector = MockDetector::new().with_page_regions(vec![Region::new(10, 10, 50, 50)]);
    let decoder = MockDecoder::new().with_result(Some("https://example.com"));
    let base = spawn_app(detector, decoder).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(multipart("scan.png", png_bytes(100, 100)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["file_name"], "scan.png");
    assert_eq!(body["qr_codes"][0]["value"], "https://example.com");
    assert_eq!(body["qr_codes"][0]["page"], 1);
    assert!(body["qr_codes"][0]["id"].as_str().is_some());
}

#[tokio::test]
async fn upload_with_no_codes_returns_empty_report() {
    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(multipart("blank.png", png_bytes(60, 60)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["qr_codes"], serde_json::json!([]));
}

#[tokio::test]
async fn disallowed_extension_is_rejected_before_pipeline() {
    let detector = MockDetector::new();
    let base = spawn_app(detector.clone(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(multipart("notes.txt", b"hello".to_vec()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("allowed"));
    assert_eq!(detector.call_count(), 0);
}

#[tokio::test]
async fn corrupt_document_is_a_client_error() {
    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(multipart("broken.png", b"not a png at all".to_vec()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Could not decode document"));
}

#[tokio::test]
async fn missing_file_part_is_rejected() {
    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let form = reqwest::multipart::Form::new().text("other", "value");
    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn decoder_hard_failure_maps_to_opaque_500() {
    let detector = MockDetector::new().with_page_regions(vec![Region::new(0, 0, 20, 20)]);
    let base = spawn_app(detector, MockDecoder::failing()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/file", base))
        .multipart(multipart("qr.png", png_bytes(100, 100)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Internal Server Error");
}

#[tokio::test]
async fn url_endpoint_fetches_and_extracts() {
    let source = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/scan.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(80, 80), "image/png"))
        .mount(&source)
        .await;

    let detector = MockDetector::new().with_page_regions(vec![Region::new(5, 5, 40, 40)]);
    let decoder = MockDecoder::new().with_result(Some("from-url"));
    let base = spawn_app(detector, decoder).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/url", base))
        .json(&serde_json::json!({ "url": format!("{}/docs/scan.png", source.uri()) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["file_name"], "scan.png");
    assert_eq!(body["qr_codes"][0]["value"], "from-url");
}

#[tokio::test]
async fn url_with_unsupported_content_type_is_rejected() {
    let source = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"<html></html>".to_vec(), "text/html"),
        )
        .mount(&source)
        .await;

    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/url", base))
        .json(&serde_json::json!({ "url": format!("{}/page.html", source.uri()) }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("supported file format"));
}

#[tokio::test]
async fn unreachable_url_is_rejected() {
    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/extract/url", base))
        .json(&serde_json::json!({ "url": "http://127.0.0.1:1/doc.pdf" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn healthz_reports_backend_status() {
    let base = spawn_app(MockDetector::new(), MockDecoder::new()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/healthz", base))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["detector"], true);
    assert_eq!(body["decoder"], true);
}

#[tokio::test]
async fn healthz_degrades_with_failing_backend() {
    let base = spawn_app(MockDetector::new(), MockDecoder::failing()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/healthz", base))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["decoder"], false);
}
