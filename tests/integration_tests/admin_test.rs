//! Account endpoint integration tests
//!
//! Registration, login and account management through the full router.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use super::fixtures::{get, router, seeded_store, send};

fn account(email: &str, role: &str, npsn: &str) -> Value {
    json!({
        "name": "Operator Sekolah",
        "email": email,
        "password": "rahasia123",
        "role": role,
        "npsn": npsn,
    })
}

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = router(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(account("Operator@Example.com", "admin", "")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["email"], "operator@example.com");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"]["last_login"].is_null());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "operator@example.com", "password": "rahasia123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["last_login"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "operator@example.com", "password": "salah-total" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::POST, "/api/auth/login", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_and_short_password_are_400() {
    let app = router(seeded_store());
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account("op@example.com", "admin", "")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account(" OP@example.com ", "admin", "")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already registered"));

    let mut short = account("short@example.com", "admin", "");
    short["password"] = json!("12345");
    let (status, _) = send(&app, Method::POST, "/api/admin/users", Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Account Management
// ============================================================================

#[tokio::test]
async fn test_admin_linked_to_school_by_npsn() {
    let app = router(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account("sd1@example.com", "admin", "20219001")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["npsn"], "20219001");
    assert!(!body["data"]["school_id"].as_str().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account("ghost@example.com", "admin", "00000000")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = router(seeded_store());
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account("op@example.com", "admin", "")),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{id}"),
        Some(json!({ "phone": "0812-0000-0000", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "email": "op@example.com", "password": "rahasia123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/admin/users/{id}/reset-password"),
        Some(json!({ "newPassword": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/admin/users/{id}/reset-password"),
        Some(json!({ "new_password": "kata-sandi-baru" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/api/admin/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/admin/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, &format!("/api/admin/users/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_superadmin_delete_is_forbidden() {
    let app = router(seeded_store());
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/admin/users",
        Some(account("root@example.com", "superadmin", "20219001")),
    )
    .await;
    assert_eq!(body["data"]["npsn"], "");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/admin/users/{id}"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_accreditation_values_are_distinct() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/admin/schools/akreditasi/list").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let values: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(values.contains(&"A"));
    assert!(values.contains(&"B"));
    assert!(values.contains(&"Belum Terakreditasi"));
}
