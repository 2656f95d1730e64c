//! School endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::response::{ApiJson, ApiQuery, ApiResponse, ApiResult};
use super::server::AppState;
use super::{parse_param, text_param};
use crate::error::{Error, Result};
use crate::models::{NewSchool, School, SchoolUpdate};
use crate::stats::{self, RegencyComparison, SpreadAnalysis, SpreadSort};
use crate::storage::{SchoolFilter, SchoolRepository};

const DEFAULT_LIMIT: u32 = 50;

/// Listing query for `GET /api/schools`
#[derive(Debug, Default, Deserialize)]
pub struct SchoolQuery {
    pub jenjang: Option<String>,
    pub status_sekolah: Option<String>,
    pub kecamatan: Option<String>,
    pub kabupaten: Option<String>,
    pub akreditasi: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SchoolQuery {
    fn filter(&self) -> Result<SchoolFilter> {
        Ok(SchoolFilter {
            level: parse_param(&self.jenjang)?,
            ownership: parse_param(&self.status_sekolah)?,
            district: text_param(&self.kecamatan),
            regency: text_param(&self.kabupaten),
            accreditation: parse_param(&self.akreditasi)?,
            search: text_param(&self.search),
        })
    }
}

/// Filters of the spread analysis
#[derive(Debug, Default, Deserialize)]
pub struct SpreadQuery {
    pub jenjang: Option<String>,
    pub status: Option<String>,
    pub akreditasi: Option<String>,
    pub kabupaten: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ComparisonQuery {
    pub kabupaten1: Option<String>,
    pub kabupaten2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegencyQuery {
    pub kabupaten: Option<String>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SchoolQuery>,
) -> ApiResult<Vec<School>> {
    let filter = query.filter()?;
    let page = state.pagination(query.page, query.limit, DEFAULT_LIMIT);
    let result = state
        .with_store(move |store| store.list_schools(&filter, page))
        .await?;
    Ok(Json(ApiResponse::paginated(result)))
}

pub(super) async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<School> {
    let school = state
        .with_store(move |store| store.get_school(&id)?.ok_or_else(|| Error::not_found("School", id)))
        .await?;
    Ok(Json(ApiResponse::success(school)))
}

pub(super) async fn by_npsn(
    State(state): State<AppState>,
    Path(npsn): Path<String>,
) -> ApiResult<School> {
    let school = state
        .with_store(move |store| {
            store
                .find_school_by_npsn(npsn.trim())?
                .ok_or_else(|| Error::not_found("School", npsn))
        })
        .await?;
    Ok(Json(ApiResponse::success(school)))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<NewSchool>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<School>>), Error> {
    payload.validate()?;
    let school = payload.into_school();

    let school = state
        .with_store(move |store| {
            store.insert_school(&school)?;
            Ok(school)
        })
        .await?;

    tracing::info!(id = %school.id, npsn = %school.npsn, "School created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(school).with_message("School created")),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<SchoolUpdate>,
) -> ApiResult<School> {
    let school = state
        .with_store(move |store| {
            let mut school = store
                .get_school(&id)?
                .ok_or_else(|| Error::not_found("School", id))?;
            update.apply(&mut school)?;
            store.update_school(&school)?;
            Ok(school)
        })
        .await?;

    tracing::info!(id = %school.id, "School updated");
    Ok(Json(ApiResponse::success(school).with_message("School updated")))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let removed_id = id.clone();
    let existed = state.with_store(move |store| store.delete_school(&id)).await?;
    if !existed {
        return Err(Error::not_found("School", removed_id));
    }

    tracing::info!(id = %removed_id, "School deleted");
    Ok(Json(ApiResponse::message("School deleted")))
}

pub(super) async fn statistics(State(state): State<AppState>) -> ApiResult<stats::SchoolStats> {
    let schools = state
        .with_store(|store| store.find_schools(&SchoolFilter::default()))
        .await?;
    Ok(Json(ApiResponse::success(stats::school_stats(&schools))))
}

pub(super) async fn spread(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SpreadQuery>,
) -> ApiResult<SpreadAnalysis> {
    let filter = SchoolFilter {
        level: parse_param(&query.jenjang)?,
        ownership: parse_param(&query.status)?,
        accreditation: parse_param(&query.akreditasi)?,
        regency: text_param(&query.kabupaten),
        ..Default::default()
    };
    let sort = SpreadSort::parse_or_default(query.sort_by.as_deref());

    let schools = state.with_store(move |store| store.find_schools(&filter)).await?;
    Ok(Json(ApiResponse::success(stats::spread_analysis(&schools, sort))))
}

pub(super) async fn comparison(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ComparisonQuery>,
) -> ApiResult<Vec<RegencyComparison>> {
    let (Some(first), Some(second)) = (text_param(&query.kabupaten1), text_param(&query.kabupaten2))
    else {
        return Err(Error::validation("kabupaten1 and kabupaten2 are both required"));
    };

    let schools = state
        .with_store(|store| store.find_schools(&SchoolFilter::default()))
        .await?;
    let rows = stats::compare_regencies(&schools, &first, &second)?;
    Ok(Json(ApiResponse::list(rows)))
}

pub(super) async fn districts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RegencyQuery>,
) -> ApiResult<Vec<stats::DistrictEntry>> {
    let filter = SchoolFilter {
        regency: text_param(&query.kabupaten),
        ..Default::default()
    };
    let schools = state.with_store(move |store| store.find_schools(&filter)).await?;
    Ok(Json(ApiResponse::list(stats::district_list(&schools))))
}

pub(super) async fn regencies(State(state): State<AppState>) -> ApiResult<Vec<stats::RegencyEntry>> {
    let schools = state
        .with_store(|store| store.find_schools(&SchoolFilter::default()))
        .await?;
    Ok(Json(ApiResponse::list(stats::regency_list(&schools))))
}
