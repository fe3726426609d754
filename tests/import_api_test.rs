mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use vacancy_importer::database::memory::MemoryCatalogStore;
use vacancy_importer::services::encoding_service::EncodingResolver;
use vacancy_importer::{routes, AppState};

use common::{AREAS, EMPLOYERS, JOB_CATEGORIES, VACANCIES};

const BOUNDARY: &str = "vacancy-import-boundary";

fn app(store: MemoryCatalogStore, require_all_files: bool) -> Router {
    let state = AppState::with_store(store, EncodingResolver::default(), require_all_files);
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/take-data",
            post(routes::import::take_data::<MemoryCatalogStore>),
        )
        .with_state(state)
}

fn multipart_body(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}.csv\"\r\n",
                name, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(parts: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/take-data")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_of_all_files_returns_stats() {
    let store = MemoryCatalogStore::new();
    let response = app(store.clone(), true)
        .oneshot(upload(&[
            ("area", AREAS),
            ("job_category", JOB_CATEGORIES),
            ("employees", EMPLOYERS),
            ("vacancy", VACANCIES),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Files processed successfully");
    assert_eq!(body["stats"]["areas_created"], 2);
    assert_eq!(body["stats"]["categories_created"], 2);
    assert_eq!(body["stats"]["employers_created"], 2);
    assert_eq!(body["stats"]["vacancies_created"], 2);
    assert_eq!(body["stats"]["skipped"][0]["file"], "vacancy");

    assert_eq!(store.snapshot().await.vacancies.len(), 2);
}

#[tokio::test]
async fn missing_file_is_rejected_before_import() {
    let store = MemoryCatalogStore::new();
    let response = app(store.clone(), true)
        .oneshot(upload(&[("area", AREAS), ("employees", EMPLOYERS)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "All 4 files are required, missing: job_category, vacancy"
    );
    assert!(store.snapshot().await.areas.is_empty());
}

#[tokio::test]
async fn partial_upload_is_accepted_when_files_are_optional() {
    let store = MemoryCatalogStore::new();
    let response = app(store.clone(), false)
        .oneshot(upload(&[("area", AREAS), ("unrelated", "ignored")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["stats"]["areas_created"], 2);
    assert!(body["stats"].get("vacancies_created").is_none());
}

#[tokio::test]
async fn health_reports_ok() {
    let response = app(MemoryCatalogStore::new(), true)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}
