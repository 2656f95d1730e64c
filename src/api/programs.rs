//! Education program endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::response::{ApiJson, ApiResponse, ApiResult};
use super::server::AppState;
use crate::error::Error;
use crate::models::{EducationProgram, NewProgram, ProgramUpdate, ProgramWithSchool};
use crate::stats::{self, ProgramYearStats};
use crate::storage::ProgramRepository;

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Vec<ProgramWithSchool>> {
    let programs = state.with_store(|store| store.list_programs()).await?;
    Ok(Json(ApiResponse::list(programs)))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ProgramWithSchool> {
    let program = state
        .with_store(move |store| {
            store
                .get_program(&id)?
                .ok_or_else(|| Error::not_found("Program", id))
        })
        .await?;
    Ok(Json(ApiResponse::success(program)))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewProgram>,
) -> std::result::Result<(StatusCode, Json<ApiResponse<EducationProgram>>), Error> {
    let program = payload.into_program()?;

    let program = state
        .with_store(move |store| {
            store.insert_program(&program)?;
            Ok(program)
        })
        .await?;

    tracing::info!(id = %program.id, school_id = %program.school_id, "Program created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(program).with_message("Program created")),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProgramUpdate>,
) -> ApiResult<ProgramWithSchool> {
    let program = state
        .with_store(move |store| {
            let ProgramWithSchool { mut program, .. } = store
                .get_program(&id)?
                .ok_or_else(|| Error::not_found("Program", id.clone()))?;
            update.apply(&mut program)?;
            store.update_program(&program)?;
            store
                .get_program(&id)?
                .ok_or_else(|| Error::not_found("Program", id))
        })
        .await?;

    tracing::info!(id = %program.program.id, "Program updated");
    Ok(Json(ApiResponse::success(program).with_message("Program updated")))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let removed_id = id.clone();
    let existed = state.with_store(move |store| store.delete_program(&id)).await?;
    if !existed {
        return Err(Error::not_found("Program", removed_id));
    }

    tracing::info!(id = %removed_id, "Program deleted");
    Ok(Json(ApiResponse::message("Program deleted")))
}

pub(super) async fn statistics(State(state): State<AppState>) -> ApiResult<Vec<ProgramYearStats>> {
    let programs: Vec<EducationProgram> = state
        .with_store(|store| store.list_programs())
        .await?
        .into_iter()
        .map(|p| p.program)
        .collect();
    Ok(Json(ApiResponse::list(stats::program_stats(&programs))))
}

pub(super) async fn for_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> ApiResult<Vec<EducationProgram>> {
    let programs = state
        .with_store(move |store| store.programs_for_school(&school_id))
        .await?;
    Ok(Json(ApiResponse::list(programs)))
}
