//! HTTP API integration tests
//!
//! Every test drives the full router (middleware included) with
//! `tower::ServiceExt::oneshot` over an in-memory store.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::fixtures::{get, router, seeded_store, send};

// ============================================================================
// Service Endpoints
// ============================================================================

#[tokio::test]
async fn test_root_lists_endpoints() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["endpoints"]["schools"], "/api/schools");
}

#[tokio::test]
async fn test_health_reports_school_count() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["schools"], 7);
}

#[tokio::test]
async fn test_unknown_route_is_enveloped_404() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    edumon::metrics::init_metrics().ok();
    let app = router(seeded_store());
    get(&app, "/api/health").await;

    let (status, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Schools
// ============================================================================

#[tokio::test]
async fn test_school_listing_defaults() {
    let app = router(seeded_store());
    let (status, body) = get(&app, "/api/schools").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 7);
    assert_eq!(body["total"], 7);
    assert_eq!(body["page"], 1);
    assert_eq!(body["pages"], 1);
    assert_eq!(body["data"][0]["name"], "SD Negeri 1 Bandung");
}

#[tokio::test]
async fn test_school_listing_filters() {
    let app = router(seeded_store());

    let (_, body) = get(&app, "/api/schools?jenjang=sd&kabupaten=bandung").await;
    assert_eq!(body["total"], 4);

    let (_, body) = get(&app, "/api/schools?status_sekolah=swasta").await;
    assert_eq!(body["total"], 2);

    let (_, body) = get(&app, "/api/schools?akreditasi=A").await;
    assert_eq!(body["total"], 2);

    let (_, body) = get(&app, "/api/schools?kecamatan=coblong").await;
    assert_eq!(body["total"], 3);

    let (_, body) = get(&app, "/api/schools?search=2023").await;
    assert_eq!(body["total"], 2);

    let (_, body) = get(&app, "/api/schools?jenjang=").await;
    assert_eq!(body["total"], 7);
}

#[tokio::test]
async fn test_school_listing_pagination() {
    let app = router(seeded_store());
    let (_, body) = get(&app, "/api/schools?page=2&limit=2").await;

    assert_eq!(body["count"], 2);
    assert_eq!(body["total"], 7);
    assert_eq!(body["page"], 2);
    assert_eq!(body["pages"], 4);
    assert_eq!(body["data"][0]["name"], "SD Negeri 3 Bandung");
}

#[tokio::test]
async fn test_invalid_filter_is_400() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/schools?jenjang=TK").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = get(&app, "/api/schools?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_school_lookup() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/schools/npsn/20230001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "SMA Negeri 1 Cibinong");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = get(&app, &format!("/api/schools/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["npsn"], "20230001");

    let (status, body) = get(&app, "/api/schools/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = get(&app, "/api/schools/npsn/99999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_school_crud() {
    let app = router(seeded_store());
    let payload = json!({
        "name": "SMP Negeri 7 Bandung",
        "npsn": "20219100",
        "level": "SMP",
        "ownership": "NEGERI",
        "address": "Jl. Ambon 23",
        "regency_name": "KOTA BANDUNG",
        "district_name": "Sumur Bandung"
    });

    let (status, body) = send(&app, Method::POST, "/api/schools", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accreditation"], "Belum Terakreditasi");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // duplicate NPSN
    let (status, body) = send(&app, Method::POST, "/api/schools", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let uri = format!("/api/schools/{id}");
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "student_count": 640, "accreditation": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["student_count"], 640);
    assert_eq!(body["data"]["name"], "SMP Negeri 7 Bandung");

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_school_payload_validation() {
    let app = router(seeded_store());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/schools",
        Some(json!({ "name": "SD Tanpa NPSN", "level": "SD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/schools",
        Some(json!({
            "name": "   ",
            "npsn": "20219999",
            "level": "SD",
            "ownership": "NEGERI",
            "address": "Jl. Kosong"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/schools/missing",
        Some(json!({ "student_count": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_school_stats_and_lists() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/schools/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_object());

    let (_, body) = get(&app, "/api/schools/kabupaten").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(&app, "/api/schools/kecamatan?kabupaten=bandung").await;
    assert_eq!(body["count"], 2);
    let districts: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["district"].as_str().unwrap())
        .collect();
    assert!(districts.contains(&"Coblong"));
    assert!(districts.contains(&"Sukajadi"));
}

#[tokio::test]
async fn test_spread_analysis() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/schools/analysis/persebaran?sortBy=name-asc").await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["summary"]["regency_count"], 2);
    assert_eq!(data["summary"]["total_schools"], 7);
    assert_eq!(data["summary"]["top_regency"]["name"], "KOTA BANDUNG");
    assert_eq!(data["regencies"][0]["regency"], "KAB. BOGOR");
    assert_eq!(data["regencies"][1]["density"], "low");

    let (_, body) = get(&app, "/api/schools/analysis/persebaran?jenjang=SMA").await;
    assert_eq!(body["data"]["summary"]["total_schools"], 2);

    let (_, body) =
        get(&app, "/api/schools/analysis/persebaran?akreditasi=Tidak%20Terakreditasi").await;
    assert_eq!(body["data"]["summary"]["total_schools"], 0);
}

#[tokio::test]
async fn test_comparison_analysis() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/schools/analysis/comparison?kabupaten1=bandung").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = get(
        &app,
        "/api/schools/analysis/comparison?kabupaten1=bandung&kabupaten2=bogor",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

// ============================================================================
// Student Statistics
// ============================================================================

#[tokio::test]
async fn test_student_listing() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/students").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 6);
    assert_eq!(body["data"][0]["academic_year"], "2023/2024");

    let (_, body) = get(&app, "/api/students?tahun_ajaran=2023%2F2024&jenjang=sd").await;
    assert_eq!(body["total"], 3);

    let (_, body) = get(&app, "/api/students?limit=4").await;
    assert_eq!(body["count"], 4);
    assert_eq!(body["pages"], 2);
}

#[tokio::test]
async fn test_student_summaries() {
    let app = router(seeded_store());

    let (_, body) = get(&app, "/api/students/tahun-ajaran").await;
    assert_eq!(body["data"], json!(["2022/2023", "2023/2024"]));

    let (_, body) = get(&app, "/api/students/summary/kabupaten?tahun_ajaran=2023%2F2024").await;
    assert_eq!(body["data"][0]["regency"], "KOTA BANDUNG");
    assert_eq!(body["data"][0]["total_students"], 3000);

    let (_, body) = get(&app, "/api/students/summary/jenjang").await;
    assert_eq!(body["count"], 2);

    let (_, body) = get(&app, "/api/students/trends?kabupaten=bandung").await;
    assert!(body["count"].as_u64().unwrap() >= 3);

    let (status, body) = get(&app, "/api/students/stats?tahun_ajaran=2023%2F2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_students"], 6600);
    assert_eq!(body["data"]["total_records"], 5);
}

// ============================================================================
// Programs
// ============================================================================

#[tokio::test]
async fn test_program_crud() {
    let app = router(seeded_store());
    let (_, body) = get(&app, "/api/schools/npsn/20219001").await;
    let school_id = body["data"]["id"].as_str().unwrap().to_string();

    let payload = json!({
        "id": "PIP-2024-001",
        "name": "Program Indonesia Pintar",
        "year": 2024,
        "recipients": 120,
        "school_id": school_id,
    });
    let (status, body) = send(&app, Method::POST, "/api/programs", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["recipients"], 120);

    let (status, _) = send(&app, Method::POST, "/api/programs", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/programs",
        Some(json!({
            "id": "KIP-1",
            "name": "Kartu Indonesia Pintar",
            "year": 2024,
            "recipients": 5,
            "school_id": "no-such-school",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/api/programs").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["school"]["name"], "SD Negeri 1 Bandung");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/programs/PIP-2024-001",
        Some(json!({ "recipients": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recipients"], 150);
    assert_eq!(body["data"]["school"]["level"], "SD");

    let (_, body) = get(&app, &format!("/api/programs/school/{school_id}")).await;
    assert_eq!(body["count"], 1);

    let (_, body) = get(&app, "/api/programs/stats").await;
    assert_eq!(body["data"][0]["year"], 2024);
    assert_eq!(body["data"][0]["total_recipients"], 150);

    let (status, _) = send(&app, Method::DELETE, "/api/programs/PIP-2024-001", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/api/programs/PIP-2024-001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_program_year_out_of_range() {
    let app = router(seeded_store());
    let (_, body) = get(&app, "/api/schools/npsn/20219001").await;
    let school_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/programs",
        Some(json!({
            "id": "OLD-1",
            "name": "Program Lama",
            "year": 1990,
            "recipients": 1,
            "school_id": school_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("year"));
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
async fn test_dashboard_stats() {
    let app = router(seeded_store());

    let (status, body) = get(&app, "/api/dashboard/stats?tahun_ajaran=2023%2F2024").await;
    assert_eq!(status, StatusCode::OK);

    let overview = &body["data"]["overview"];
    assert_eq!(overview["school_count"], 7);
    assert_eq!(overview["student_total"], 6600);
    assert_eq!(overview["program_count"], 0);
    assert_eq!(overview["regency_count"], 2);
    assert_eq!(overview["academic_years"].as_array().unwrap().len(), 2);

    let (_, body) = get(&app, "/api/dashboard/stats").await;
    assert_eq!(body["data"]["overview"]["student_total"], 8100);
}
