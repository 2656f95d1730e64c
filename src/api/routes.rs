//! Route table and service endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::response::{ApiResponse, ApiResult};
use super::server::AppState;
use super::{admins, dashboard, programs, schools, students};
use crate::metrics;
use crate::storage::SchoolRepository;

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
///
/// Fixed segments such as `/api/schools/stats` are matched ahead of the
/// `/{id}` captures, so their registration order does not matter.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        // Schools
        .route("/api/schools", get(schools::list).post(schools::create))
        .route("/api/schools/stats", get(schools::statistics))
        .route("/api/schools/analysis/persebaran", get(schools::spread))
        .route("/api/schools/analysis/comparison", get(schools::comparison))
        .route("/api/schools/kecamatan", get(schools::districts))
        .route("/api/schools/kabupaten", get(schools::regencies))
        .route("/api/schools/npsn/{npsn}", get(schools::by_npsn))
        .route(
            "/api/schools/{id}",
            get(schools::get).put(schools::update).delete(schools::delete),
        )
        // Student statistics
        .route("/api/students", get(students::list).post(students::create))
        .route("/api/students/stats", get(students::statistics))
        .route("/api/students/summary/kabupaten", get(students::by_regency))
        .route("/api/students/summary/jenjang", get(students::by_level))
        .route("/api/students/trends", get(students::trends))
        .route("/api/students/tahun-ajaran", get(students::academic_years))
        // Education programs
        .route("/api/programs", get(programs::list).post(programs::create))
        .route("/api/programs/stats", get(programs::statistics))
        .route("/api/programs/school/{school_id}", get(programs::for_school))
        .route(
            "/api/programs/{id}",
            get(programs::get).put(programs::update).delete(programs::delete),
        )
        // Dashboard
        .route("/api/dashboard/stats", get(dashboard::statistics))
        // Accounts
        .route("/api/auth/register", post(admins::register))
        .route("/api/auth/login", post(admins::login))
        .route("/api/admin/users", get(admins::list).post(admins::create))
        .route(
            "/api/admin/users/{id}",
            get(admins::get).put(admins::update).delete(admins::delete),
        )
        .route(
            "/api/admin/users/{id}/reset-password",
            post(admins::reset_password),
        )
        .route(
            "/api/admin/schools/akreditasi/list",
            get(admins::accreditation_values),
        )
        .fallback(not_found)
        .with_state(state)
}

// ============================================================================
// Service Handlers
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub schools: u64,
}

/// Welcome message with the endpoint index
async fn root() -> Json<ApiResponse<serde_json::Value>> {
    Json(
        ApiResponse::success(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/api/health",
                "metrics": "/metrics",
                "schools": "/api/schools",
                "students": "/api/students",
                "programs": "/api/programs",
                "dashboard": "/api/dashboard",
                "auth": "/api/auth",
                "admin": "/api/admin",
            },
        }))
        .with_message("Welcome to the education monitoring dashboard API"),
    )
}

/// Health check endpoint; fails when the store cannot be queried
async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    let schools = state.with_store(|store| store.count_schools()).await?;

    Ok(Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        schools,
    })))
}

/// Prometheus text exposition
async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to encode metrics")),
            )
                .into_response()
        }
    }
}

async fn not_found() -> impl IntoResponse {
    let body = ApiResponse {
        success: false,
        ..ApiResponse::message("Route not found")
    };
    (StatusCode::NOT_FOUND, Json(body))
}
