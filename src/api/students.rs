//! Student statistic endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::response::{ApiJson, ApiQuery, ApiResponse, ApiResult};
use super::server::AppState;
use super::{parse_param, text_param};
use crate::error::{Error, Result};
use crate::models::StudentStatistic;
use crate::seeding::{import_statistics, StatisticBatch};
use crate::stats::{
    self, LevelStudentSummary, OverallStudentStats, RegencyStudentSummary, StudentTrendPoint,
};
use crate::storage::{StatisticFilter, StudentStatisticRepository};

const DEFAULT_LIMIT: u32 = 20;

/// Query shared by the student endpoints; summaries ignore paging
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub jenjang: Option<String>,
    pub status_sekolah: Option<String>,
    pub kabupaten: Option<String>,
    pub tahun_ajaran: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl StudentQuery {
    fn filter(&self) -> Result<StatisticFilter> {
        Ok(StatisticFilter {
            level: parse_param(&self.jenjang)?,
            ownership: parse_param(&self.status_sekolah)?,
            regency: text_param(&self.kabupaten),
            academic_year: text_param(&self.tahun_ajaran),
        })
    }
}

async fn load(state: &AppState, query: &StudentQuery) -> Result<Vec<StudentStatistic>> {
    let filter = query.filter()?;
    state
        .with_store(move |store| store.find_statistics(&filter))
        .await
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> ApiResult<Vec<StudentStatistic>> {
    let filter = query.filter()?;
    let page = state.pagination(query.page, query.limit, DEFAULT_LIMIT);
    let result = state
        .with_store(move |store| store.list_statistics(&filter, page))
        .await?;
    Ok(Json(ApiResponse::paginated(result)))
}

/// Ingest one row or an array of rows in a single transaction
pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(batch): ApiJson<StatisticBatch>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<Vec<StudentStatistic>>>), Error> {
    let rows = batch.into_rows();
    let (stored, _) = state
        .with_store(move |store| import_statistics(store, rows, false))
        .await?;

    let message = format!("{} student statistic rows stored", stored.len());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::list(stored).with_message(message)),
    ))
}

pub(super) async fn statistics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> ApiResult<OverallStudentStats> {
    let rows = load(&state, &query).await?;
    Ok(Json(ApiResponse::success(stats::overall_student_stats(&rows))))
}

pub(super) async fn by_regency(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> ApiResult<Vec<RegencyStudentSummary>> {
    let rows = load(&state, &query).await?;
    Ok(Json(ApiResponse::list(stats::students_by_regency(&rows))))
}

pub(super) async fn by_level(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> ApiResult<Vec<LevelStudentSummary>> {
    let rows = load(&state, &query).await?;
    Ok(Json(ApiResponse::list(stats::students_by_level(&rows))))
}

pub(super) async fn trends(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StudentQuery>,
) -> ApiResult<Vec<StudentTrendPoint>> {
    let rows = load(&state, &query).await?;
    Ok(Json(ApiResponse::list(stats::student_trends(&rows))))
}

pub(super) async fn academic_years(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let years = state.with_store(|store| store.academic_years()).await?;
    Ok(Json(ApiResponse::list(years)))
}
