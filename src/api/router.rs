//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost first): CORS, request tracing, body limit.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Slack on top of the file limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let body_limit = core.upload.max_file_size + MULTIPART_OVERHEAD_BYTES;
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/upload", post(endpoints::upload::upload))
        .route("/onboarding", post(endpoints::onboarding::submit))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    use crate::clock::FixedClock;
    use crate::config::UploadConfig;
    use crate::models::onboarding::tests::sample_form;
    use crate::models::{LabCategory, ReferenceRange};
    use crate::pipeline::extraction::{
        DocumentKind, ExtractionError, ExtractionMethod, ExtractionResult, TextExtractor,
    };
    use crate::pipeline::labs::{LabCatalogue, ParseFailurePolicy, PatternEntry};

    const BOUNDARY: &str = "labscan-test-boundary";

    /// Returns fixed text and counts how often it was asked.
    struct StubExtractor {
        text: String,
        calls: AtomicUsize,
    }

    impl TextExtractor for StubExtractor {
        fn extract(&self, _bytes: &[u8], kind: DocumentKind) -> Result<ExtractionResult, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let method = match kind {
                DocumentKind::Pdf => ExtractionMethod::PdfDirect,
                DocumentKind::Image => ExtractionMethod::TesseractOcr,
            };
            Ok(ExtractionResult {
                method,
                text: self.text.clone(),
            })
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<ExtractionResult, ExtractionError> {
            Err(ExtractionError::PdfParsing("invalid xref table".into()))
        }
    }

    struct SlowExtractor;

    impl TextExtractor for SlowExtractor {
        fn extract(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<ExtractionResult, ExtractionError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(ExtractionResult {
                method: ExtractionMethod::PdfDirect,
                text: String::new(),
            })
        }
    }

    fn stub(text: &str) -> Arc<StubExtractor> {
        Arc::new(StubExtractor {
            text: text.into(),
            calls: AtomicUsize::new(0),
        })
    }

    fn test_core_with(
        catalogue: LabCatalogue,
        extractor: Arc<dyn TextExtractor>,
        upload: UploadConfig,
    ) -> Arc<CoreState> {
        Arc::new(CoreState::new(
            catalogue,
            extractor,
            Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
            upload,
        ))
    }

    fn test_core(extractor: Arc<dyn TextExtractor>) -> Arc<CoreState> {
        test_core_with(LabCatalogue::standard().unwrap(), extractor, UploadConfig::default())
    }

    fn multipart_body(field: &str, file_name: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n")
                .as_bytes(),
        );
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_response_shape() {
        let app = api_router(test_core(stub("")));
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
        assert_eq!(json["catalogueSize"], 10);
    }

    #[tokio::test]
    async fn not_found_for_unknown_route() {
        let app = api_router(test_core(stub("")));
        let req = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pdf_upload_returns_lab_results() {
        let extractor = stub("Glicose: 105 mg/dl\nHDL 55 mg/dl");
        let app = api_router(test_core(extractor.clone()));
        let body = multipart_body("file", "exame.pdf", Some("application/pdf"), b"%PDF-1.4 fake");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);

        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["processed"], true);
        assert!(json["fileId"].as_str().unwrap().starts_with("file_"));
        assert_eq!(json["fileName"], "exame.pdf");
        assert_eq!(json["fileSize"], 13);
        assert_eq!(json["fileType"], "application/pdf");
        assert_eq!(json["extractedText"], "Glicose: 105 mg/dl\nHDL 55 mg/dl");
        assert!(json.get("skippedMatches").is_none());

        let results = json["labResults"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["testName"], "Glucose");
        assert_eq!(results[0]["value"], 105.0);
        assert_eq!(results[0]["unit"], "mg/dl");
        assert_eq!(results[0]["referenceMin"], 70.0);
        assert_eq!(results[0]["referenceMax"], 99.0);
        assert_eq!(results[0]["isAbnormal"], true);
        assert_eq!(results[0]["date"], "2024-03-01");
        assert_eq!(results[0]["category"], "glucose");
        assert_eq!(results[1]["testName"], "Hdl");
        assert_eq!(results[1]["isAbnormal"], false);
    }

    #[tokio::test]
    async fn image_upload_without_lab_values_succeeds_empty() {
        let app = api_router(test_core(stub("Receita: repouso e hidratação")));
        let body = multipart_body("file", "foto.jpg", Some("image/jpeg"), b"\xFF\xD8\xFF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["labResults"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn extracted_text_is_truncated() {
        let long_text = "é".repeat(1500);
        let app = api_router(test_core(stub(&long_text)));
        let body = multipart_body("file", "scan.png", Some("image/png"), b"\x89PNG");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["extractedText"].as_str().unwrap().chars().count(), 1000);
    }

    #[tokio::test]
    async fn missing_file_returns_400() {
        let extractor = stub("Glicose 90 mg/dl");
        let app = api_router(test_core(extractor.clone()));
        let body = multipart_body("attachment", "exame.pdf", Some("application/pdf"), b"%PDF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);

        let json = response_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NO_FILE_PROVIDED");
        assert_eq!(json["error"], "Nenhum arquivo fornecido");
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_before_extraction() {
        let extractor = stub("Glicose 90 mg/dl");
        let app = api_router(test_core(extractor.clone()));
        let body = multipart_body("file", "notes.txt", Some("text/plain"), b"Glicose 90 mg/dl");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);

        let json = response_json(response).await;
        assert_eq!(json["code"], "UNSUPPORTED_FILE_TYPE");
    }

    #[tokio::test]
    async fn file_part_without_content_type_is_unsupported() {
        let extractor = stub("");
        let app = api_router(test_core(extractor.clone()));
        let body = multipart_body("file", "exame.pdf", None, b"%PDF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_file_returns_413() {
        let extractor = stub("");
        let core = test_core_with(
            LabCatalogue::standard().unwrap(),
            extractor.clone(),
            UploadConfig {
                max_file_size: 16,
                ..UploadConfig::default()
            },
        );
        let app = api_router(core);
        let body = multipart_body("file", "big.pdf", Some("application/pdf"), &[b'x'; 64]);

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);

        let json = response_json(response).await;
        assert_eq!(json["code"], "FILE_TOO_LARGE");
    }

    #[tokio::test]
    async fn non_multipart_body_returns_400() {
        let app = api_router(test_core(stub("")));
        let response = app
            .oneshot(json_request("/api/upload", b"{}".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn extraction_failure_returns_500() {
        let app = api_router(test_core(Arc::new(FailingExtractor)));
        let body = multipart_body("file", "exame.pdf", Some("application/pdf"), b"%PDF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["code"], "EXTRACTION_FAILED");
        assert_eq!(json["error"], "Erro ao extrair texto do arquivo");
    }

    #[tokio::test]
    async fn slow_extraction_returns_504() {
        let core = test_core_with(
            LabCatalogue::standard().unwrap(),
            Arc::new(SlowExtractor),
            UploadConfig {
                extraction_timeout: Duration::from_millis(20),
                ..UploadConfig::default()
            },
        );
        let app = api_router(core);
        let body = multipart_body("file", "exame.pdf", Some("application/pdf"), b"%PDF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let json = response_json(response).await;
        assert_eq!(json["code"], "EXTRACTION_TIMED_OUT");
    }

    #[tokio::test]
    async fn report_policy_adds_skipped_matches() {
        let patterns = vec![PatternEntry::new("glucose", "glicose", &["mg/dl"], LabCategory::Glucose)
            .with_number_pattern(r"[0-9.]+")];
        let ranges = vec![("glucose".to_string(), ReferenceRange::new(70.0, 99.0, "mg/dl"))];
        let core = test_core_with(
            LabCatalogue::build(patterns, ranges).unwrap(),
            stub("Glicose 9.9.9 mg/dl\nGlicose 88 mg/dl"),
            UploadConfig {
                parse_failure_policy: ParseFailurePolicy::Report,
                ..UploadConfig::default()
            },
        );
        let app = api_router(core);
        let body = multipart_body("file", "exame.pdf", Some("application/pdf"), b"%PDF");

        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["labResults"].as_array().unwrap().len(), 1);
        assert_eq!(json["skippedMatches"][0]["testKey"], "glucose");
        assert_eq!(json["skippedMatches"][0]["rawValue"], "9.9.9");
    }

    #[tokio::test]
    async fn onboarding_returns_metabolic_profile() {
        let app = api_router(test_core(stub("")));
        let body = serde_json::to_vec(&sample_form()).unwrap();

        let response = app.oneshot(json_request("/api/onboarding", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["success"], true);
        assert!(json["patientId"].as_str().unwrap().starts_with("patient_"));
        assert_eq!(json["message"], "Onboarding concluído com sucesso!");

        let profile = &json["metabolicProfile"];
        assert_eq!(profile["age"], 34);
        assert_eq!(profile["bmiCategory"], "overweight");
        assert_eq!(profile["bmr"], 1459);
        assert_eq!(profile["tdee"], 2261);
        assert_eq!(profile["riskFactors"], serde_json::json!(["Sobrepeso/Obesidade"]));
        assert_eq!(
            profile["recommendations"],
            serde_json::json!(["Déficit calórico controlado", "Exercícios aeróbicos e resistência"])
        );
    }

    #[tokio::test]
    async fn onboarding_validation_failure_returns_400() {
        let app = api_router(test_core(stub("")));
        let mut form = sample_form();
        form.personal_info.email = "ana-at-example".into();
        let body = serde_json::to_vec(&form).unwrap();

        let response = app.oneshot(json_request("/api/onboarding", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["details"][0]["field"], "personalInfo.email");
        assert_eq!(json["details"][0]["message"], "Email inválido");
    }

    #[tokio::test]
    async fn onboarding_malformed_json_returns_400() {
        let app = api_router(test_core(stub("")));
        let body = br#"{"personalInfo": {"name": "Ana"}}"#.to_vec();

        let response = app.oneshot(json_request("/api/onboarding", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}
