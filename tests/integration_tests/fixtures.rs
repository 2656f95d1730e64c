//! Test fixtures for integration tests
//!
//! Provides a seeded store, a router over it, and request helpers

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use edumon::api::{build_router, AppState, ServerConfig};
use edumon::models::{
    Accreditation, Level, NewSchool, NewStudentStatistic, Ownership, School, StudentStatistic,
};
use edumon::storage::{SchoolRepository, SharedStore, SqliteStore, StudentStatisticRepository};

/// Schools: 5 in KOTA BANDUNG (Coblong, Sukajadi), 2 in KAB. BOGOR (Cibinong)
pub const SCHOOL_FIXTURES: &[(&str, &str, Level, Ownership, &str, &str, Accreditation)] = &[
    ("SD Negeri 1 Bandung", "20219001", Level::Sd, Ownership::Negeri, "KOTA BANDUNG", "Coblong", Accreditation::A),
    ("SD Negeri 2 Bandung", "20219002", Level::Sd, Ownership::Negeri, "KOTA BANDUNG", "Sukajadi", Accreditation::Pending),
    ("SD Negeri 3 Bandung", "20219003", Level::Sd, Ownership::Negeri, "KOTA BANDUNG", "Coblong", Accreditation::Pending),
    ("SD Swasta Harapan", "20219004", Level::Sd, Ownership::Swasta, "KOTA BANDUNG", "Coblong", Accreditation::Pending),
    ("SMA Negeri 3 Bandung", "20219005", Level::Sma, Ownership::Negeri, "KOTA BANDUNG", "Sukajadi", Accreditation::A),
    ("SMA Negeri 1 Cibinong", "20230001", Level::Sma, Ownership::Negeri, "KAB. BOGOR", "Cibinong", Accreditation::B),
    ("SMK Swasta Bina", "20230002", Level::Smk, Ownership::Swasta, "KAB. BOGOR", "Cibinong", Accreditation::Pending),
];

/// Statistics: Bandung SD NEGERI has two years; Garut has no schools;
/// Bogor SMK SWASTA has no statistic
pub const STATISTIC_FIXTURES: &[(&str, Level, Ownership, u64, &str)] = &[
    ("KOTA BANDUNG", Level::Sd, Ownership::Negeri, 1500, "2022/2023"),
    ("KOTA BANDUNG", Level::Sd, Ownership::Negeri, 1800, "2023/2024"),
    ("KOTA BANDUNG", Level::Sd, Ownership::Swasta, 300, "2023/2024"),
    ("KOTA BANDUNG", Level::Sma, Ownership::Negeri, 900, "2023/2024"),
    ("KAB. BOGOR", Level::Sma, Ownership::Negeri, 1100, "2023/2024"),
    ("KAB. GARUT", Level::Sd, Ownership::Negeri, 2500, "2023/2024"),
];

pub fn school(
    (name, npsn, level, ownership, regency, district, accreditation): (
        &str,
        &str,
        Level,
        Ownership,
        &str,
        &str,
        Accreditation,
    ),
) -> School {
    NewSchool {
        name: name.to_string(),
        npsn: npsn.to_string(),
        level,
        ownership,
        address: format!("Jl. Pendidikan No. {}", &npsn[6..]),
        province_code: "32".to_string(),
        province_name: "JAWA BARAT".to_string(),
        regency_code: String::new(),
        regency_name: regency.to_string(),
        bps_district_code: String::new(),
        bps_district_name: String::new(),
        district_code: String::new(),
        district_name: district.to_string(),
        year: 2023,
        student_count: 0,
        accreditation,
    }
    .into_school()
}

pub fn statistic(
    (regency, level, ownership, count, year): (&str, Level, Ownership, u64, &str),
) -> StudentStatistic {
    NewStudentStatistic {
        province_code: "32".to_string(),
        province_name: "JAWA BARAT".to_string(),
        regency_code: String::new(),
        regency_name: regency.to_string(),
        level,
        ownership,
        student_count: count,
        academic_year: year.to_string(),
    }
    .into_statistic()
    .unwrap()
}

/// In-memory store with the fixture schools and no statistics
pub fn schools_only_store() -> SharedStore {
    let store = SqliteStore::in_memory().unwrap();
    for fixture in SCHOOL_FIXTURES {
        store.insert_school(&school(*fixture)).unwrap();
    }
    Arc::new(store)
}

/// In-memory store loaded with every fixture
pub fn seeded_store() -> SharedStore {
    let store = schools_only_store();
    let statistics: Vec<StudentStatistic> =
        STATISTIC_FIXTURES.iter().copied().map(statistic).collect();
    store.insert_statistics(&statistics).unwrap();
    store
}

/// Router over a store, without request tracing
pub fn router(store: SharedStore) -> Router {
    let config = ServerConfig::builder()
        .enable_request_logging(false)
        .max_page_size(100)
        .build()
        .unwrap();
    build_router(AppState::new(store, config))
}

/// Send a request and decode the JSON body
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}
