//! HTTP AI service against a mock AI backend.

use std::time::{Duration, Instant};

use notebook_client::{ClientConfig, HttpAiService};
use notebook_core::{defaults, AiService, Error, ErrorKind, UploadFile};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> HttpAiService {
    HttpAiService::new(&ClientConfig::with_base_url(server.uri())).expect("client")
}

fn pdf(bytes: usize) -> UploadFile {
    UploadFile::new("lecture.pdf", "application/pdf", vec![b'x'; bytes])
}

// ─── Generation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_summarize() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .and(body_json(json!({"content": "Long text about rivers"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Rivers."})))
        .expect(1)
        .mount(&server)
        .await;

    let summary = service_for(&server)
        .summarize("Long text about rivers")
        .await
        .unwrap();
    assert_eq!(summary, "Rivers.");
}

#[tokio::test]
async fn test_summarize_empty_input_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server).summarize("   \n").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
}

#[tokio::test]
async fn test_summarize_success_without_field_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/summarize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Rivers."})))
        .mount(&server)
        .await;

    let err = service_for(&server).summarize("text").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_generate_quiz_sanitizes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quiz": {
                "mcq": [
                    {"question": "2+2?", "options": ["3", "4", "5"], "answer": "4"},
                    {"question": "Bad", "options": ["a", "b"], "answer": "z"}
                ],
                "fill_blank": [{"question": "Water is H_O", "answer": "2"}]
            }
        })))
        .mount(&server)
        .await;

    let quiz = service_for(&server).generate_quiz("math").await.unwrap();
    assert_eq!(quiz.mcq.as_ref().unwrap().len(), 1);
    assert!(quiz.true_false.is_none());
    assert_eq!(quiz.question_count(), 2);
}

#[tokio::test]
async fn test_generate_quiz_without_sections_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quiz": {}})))
        .mount(&server)
        .await;

    let err = service_for(&server).generate_quiz("math").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_generate_mindmap_accepts_encoded_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mindmap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mindmap": "{\"central\":\"Rust\",\"branches\":[{\"topic\":\"Ownership\",\"subtopics\":[]}]}"
        })))
        .mount(&server)
        .await;

    let map = service_for(&server).generate_mindmap("rust").await.unwrap();
    assert_eq!(map.central, "Rust");
    assert_eq!(
        map.branches[0].display_subtopics(),
        vec![defaults::NO_SUBTOPICS_PLACEHOLDER]
    );
}

#[tokio::test]
async fn test_generate_mindmap_without_central_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mindmap"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"mindmap": {"central": "", "branches": []}})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server).generate_mindmap("rust").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_generation_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mindmap"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
        .mount(&server)
        .await;

    let err = service_for(&server).generate_mindmap("rust").await.unwrap_err();
    assert!(matches!(err, Error::Server { status: 503, ref message } if message == "model loading"));
}

// ─── Extraction ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_primary_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Hello world",
            "title": "Hello world...",
            "pages": 2,
            "filename": "lecture.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/handwriting"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    let extraction = service_for(&server).extract_text(&pdf(64)).await.unwrap();
    assert_eq!(extraction.text, "Hello world");
    assert_eq!(extraction.suggested_title.as_deref(), Some("Hello world..."));
    assert_eq!(extraction.page_count, Some(2));
    assert_eq!(extraction.endpoint, "/api/upload-pdf");
}

#[tokio::test]
async fn test_extract_falls_back_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-pdf"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "parser crashed"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/handwriting"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "Recovered"})))
        .expect(1)
        .mount(&server)
        .await;

    let extraction = service_for(&server).extract_text(&pdf(64)).await.unwrap();
    assert_eq!(extraction.text, "Recovered");
    assert_eq!(extraction.endpoint, "/api/handwriting");
    assert!(extraction.suggested_title.is_none());
}

#[tokio::test]
async fn test_extract_both_fail_surfaces_fallback_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-pdf"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/handwriting"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Could not extract meaningful text from the image"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = service_for(&server).extract_text(&pdf(64)).await.unwrap_err();
    assert!(err.to_string().contains("Could not extract meaningful text"));
}

#[tokio::test]
async fn test_extract_empty_text_does_not_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "", "pages": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/handwriting"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server).extract_text(&pdf(64)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_extract_over_limit_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let file = pdf(defaults::MAX_UPLOAD_BYTES as usize + 1);
    let err = service_for(&server).extract_text(&file).await.unwrap_err();
    assert!(matches!(
        err,
        Error::PayloadTooLarge {
            size,
            limit
        } if size == defaults::MAX_UPLOAD_BYTES + 1 && limit == defaults::MAX_UPLOAD_BYTES
    ));
}

#[tokio::test]
async fn test_extract_at_limit_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "big"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = pdf(defaults::MAX_UPLOAD_BYTES as usize);
    let extraction = service_for(&server).extract_text(&file).await.unwrap();
    assert_eq!(extraction.text, "big");
}

#[tokio::test]
async fn test_custom_extract_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "ocr"})))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server).with_extract_endpoints(vec!["/api/ocr".to_string()]);
    assert_eq!(service.extract_text(&pdf(8)).await.unwrap().text, "ocr");
}

#[tokio::test]
async fn test_extract_timeout_bounds_both_attempts() {
    let server = MockServer::start().await;
    for endpoint in ["/api/upload-pdf", "/api/handwriting"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"text": "late"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
    }
    let config = ClientConfig {
        extract_timeout_secs: 1,
        ..ClientConfig::with_base_url(server.uri())
    };
    let service = HttpAiService::new(&config).unwrap();

    let started = Instant::now();
    let err = service.extract_text(&pdf(64)).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert!(err.to_string().contains("extraction timed out"));
}

// ─── Status ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "version": "2.0.0"})))
        .mount(&server)
        .await;

    assert!(service_for(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_unreachable_is_false() {
    let server = MockServer::start().await;
    let config = ClientConfig::with_base_url(server.uri());
    drop(server);

    let service = HttpAiService::new(&config).unwrap();
    assert!(!service.health_check().await.unwrap());
}
