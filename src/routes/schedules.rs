use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    access::{self, Principal, Requirement},
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::schedule::{CreateScheduleItemRequest, ScheduleItem, UpdateScheduleItemRequest},
    models::user::Role,
    services::schedules::ScheduleService,
    AppState,
};

pub async fn list_schedule(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<ScheduleItem>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let items = ScheduleService::list_for_user(&state.db, principal.id).await?;
    Ok(Json(items))
}

/// A parent's view of a child's schedule; requires an approved link.
pub async fn list_user_schedule(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ScheduleItem>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Parent]).for_child(user_id),
    )
    .await?;

    let items = ScheduleService::list_for_user(&state.db, user_id).await?;
    Ok(Json(items))
}

pub async fn create_schedule_item(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<CreateScheduleItemRequest>,
) -> Result<(StatusCode, Json<ScheduleItem>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let item = ScheduleService::create(&state.db, principal.id, &body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_schedule_item(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateScheduleItemRequest>,
) -> Result<Json<ScheduleItem>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let item = ScheduleService::get(&state.db, id).await?;
    access::ensure_owner(&principal, item.user_id)?;

    let item = ScheduleService::update(&state.db, id, &body).await?;
    Ok(Json(item))
}

pub async fn delete_schedule_item(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let item = ScheduleService::get(&state.db, id).await?;
    access::ensure_owner(&principal, item.user_id)?;

    ScheduleService::delete(&state.db, id).await?;
    Ok(Json(json!({ "message": "schedule item deleted" })))
}
