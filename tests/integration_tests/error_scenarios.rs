//! Error scenario integration tests
//!
//! Tests failure modes and their response envelopes:
//! 1. Malformed request bodies
//! 2. Missing or blank required fields
//! 3. Duplicate records
//! 4. Dangling school references
//! 5. Invalid query parameters

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use edumon::error::Error;
use edumon::models::{Accreditation, Level, NewProgram, Ownership};
use edumon::storage::{ProgramRepository, SchoolRepository};

use super::fixtures::{get, router, school, seeded_store, send, SCHOOL_FIXTURES};

fn assert_error_envelope(body: &Value) {
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string(), "missing error message: {body}");
    assert!(body.get("data").is_none());
}

// ============================================================================
// Request Body Errors
// ============================================================================

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = router(seeded_store());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/schools")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": \"SD"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_error_envelope(&body);
}

#[tokio::test]
async fn test_missing_content_type_is_400() {
    let app = router(seeded_store());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/programs")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_required_field_is_400() {
    let app = router(seeded_store());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/programs",
        Some(json!({
            "id": "  ",
            "name": "Program Tanpa Id",
            "year": 2024,
            "recipients": 3,
            "school_id": "anything",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body);
    assert!(body["error"].as_str().unwrap().contains("id"));
}

#[tokio::test]
async fn test_unknown_enum_value_in_body_is_400() {
    let app = router(seeded_store());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/schools",
        Some(json!({
            "name": "TK Pertiwi",
            "npsn": "20219500",
            "level": "TK",
            "ownership": "NEGERI",
            "address": "Jl. Melati 1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_envelope(&body);
}

// ============================================================================
// Storage Errors
// ============================================================================

#[test]
fn test_duplicate_npsn_is_unique_violation() {
    let store = seeded_store();
    let duplicate = school(SCHOOL_FIXTURES[0]);

    let err = store.insert_school(&duplicate).unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_program_for_missing_school_is_rejected() {
    let store = seeded_store();
    let program = NewProgram {
        id: "BOS-1".to_string(),
        name: "Bantuan Operasional Sekolah".to_string(),
        year: 2024,
        recipients: 10,
        school_id: "missing-school".to_string(),
        npsn: String::new(),
        description: String::new(),
    }
    .into_program()
    .unwrap();

    let err = store.insert_program(&program).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "unexpected error: {err:?}");
    assert!(store.list_programs().unwrap().is_empty());
}

#[test]
fn test_updating_missing_school_reports_not_found() {
    let store = seeded_store();
    let mut ghost = school((
        "Sekolah Hantu",
        "20299999",
        Level::Sd,
        Ownership::Negeri,
        "KOTA BANDUNG",
        "Coblong",
        Accreditation::Pending,
    ));
    ghost.id = "no-such-id".to_string();

    let err = store.update_school(&ghost).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Query Errors
// ============================================================================

#[tokio::test]
async fn test_invalid_query_values_are_400() {
    let app = router(seeded_store());

    for uri in [
        "/api/schools?status_sekolah=campuran",
        "/api/schools?akreditasi=Z",
        "/api/schools?limit=-1",
        "/api/students?jenjang=PAUD",
        "/api/schools/analysis/persebaran?jenjang=TK",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_error_envelope(&body);
    }
}

#[tokio::test]
async fn test_unknown_sort_falls_back_to_default() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/schools/analysis/persebaran?sortBy=random").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["regencies"][0]["regency"], "KOTA BANDUNG");
}

#[tokio::test]
async fn test_oversized_limit_is_capped() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/schools?limit=100000").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 7);
    assert_eq!(body["pages"], 1);
}
