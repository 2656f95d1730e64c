//! Account management and login endpoints

use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::response::{ApiJson, ApiResponse, ApiResult};
use super::server::AppState;
use crate::auth;
use crate::error::{Error, Result};
use crate::models::{Accreditation, Admin, AdminUpdate, Credentials, NewAdmin, PasswordReset};
use crate::storage::{AdminRepository, SchoolFilter, SchoolRepository};

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>)>;

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Vec<Admin>> {
    let admins = state.with_store(|store| store.list_admins()).await?;
    Ok(Json(ApiResponse::list(admins)))
}

pub(super) async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Admin> {
    let admin = state
        .with_store(move |store| {
            store
                .get_admin(&id)?
                .ok_or_else(|| Error::not_found("Admin", id))
        })
        .await?;
    Ok(Json(ApiResponse::success(admin)))
}

pub(super) async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAdmin>,
) -> Created<Admin> {
    let admin = state
        .with_store(move |store| auth::create_admin(store, payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(admin).with_message("Admin created")),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<AdminUpdate>,
) -> ApiResult<Admin> {
    let admin = state
        .with_store(move |store| auth::update_admin(store, &id, update))
        .await?;
    Ok(Json(ApiResponse::success(admin).with_message("Admin updated")))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state
        .with_store(move |store| auth::delete_admin(store, &id))
        .await?;
    Ok(Json(ApiResponse::message("Admin deleted")))
}

pub(super) async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(reset): ApiJson<PasswordReset>,
) -> ApiResult<()> {
    state
        .with_store(move |store| auth::reset_password(store, &id, reset))
        .await?;
    Ok(Json(ApiResponse::message("Password reset")))
}

pub(super) async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewAdmin>,
) -> Created<Admin> {
    let admin = state
        .with_store(move |store| auth::create_admin(store, payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(admin).with_message("Registration successful")),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<Admin> {
    let admin = state
        .with_store(move |store| auth::login(store, credentials))
        .await?;
    Ok(Json(ApiResponse::success(admin).with_message("Login successful")))
}

/// Distinct accreditation values present in the school table
pub(super) async fn accreditation_values(
    State(state): State<AppState>,
) -> ApiResult<Vec<Accreditation>> {
    let values = state
        .with_store(|store| {
            let schools = store.find_schools(&SchoolFilter::default())?;
            Ok(schools
                .iter()
                .map(|s| s.accreditation)
                .collect::<BTreeSet<_>>())
        })
        .await?;
    Ok(Json(ApiResponse::list(values.into_iter().collect())))
}
