//! Dashboard overview endpoint

use axum::{extract::State, Json};
use serde::Deserialize;

use super::response::{ApiQuery, ApiResponse, ApiResult};
use super::server::AppState;
use super::text_param;
use crate::stats::{self, DashboardStats};
use crate::storage::{
    ProgramRepository, SchoolFilter, SchoolRepository, StatisticFilter, StudentStatisticRepository,
};

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub tahun_ajaran: Option<String>,
}

/// Combined overview; the academic year narrows only the student parts
pub(super) async fn statistics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult<DashboardStats> {
    let filter = StatisticFilter {
        academic_year: text_param(&query.tahun_ajaran),
        ..Default::default()
    };

    let report = state
        .with_store(move |store| {
            let schools = store.find_schools(&SchoolFilter::default())?;
            let statistics = store.find_statistics(&filter)?;
            let program_count = store.list_programs()?.len() as u64;
            let years = store.academic_years()?;
            Ok(stats::dashboard_stats(&schools, &statistics, program_count, years))
        })
        .await?;

    Ok(Json(ApiResponse::success(report)))
}
