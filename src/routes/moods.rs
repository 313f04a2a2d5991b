use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    access::{self, Principal, Requirement},
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::mood::{MoodEntry, UpsertMoodRequest},
    models::user::Role,
    services::moods::MoodService,
    AppState,
};

pub async fn list_moods(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<MoodEntry>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let entries = MoodService::list_for_user(&state.db, principal.id).await?;
    Ok(Json(entries))
}

/// A parent's view of a child's mood history; requires an approved link.
pub async fn list_user_moods(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<MoodEntry>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Parent]).for_child(user_id),
    )
    .await?;

    let entries = MoodService::list_for_user(&state.db, user_id).await?;
    Ok(Json(entries))
}

pub async fn upsert_mood(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<UpsertMoodRequest>,
) -> Result<Json<MoodEntry>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let entry = MoodService::upsert(&state.db, principal.id, &body).await?;
    Ok(Json(entry))
}

pub async fn delete_mood(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let entry = MoodService::get(&state.db, id).await?;
    access::ensure_owner(&principal, entry.user_id)?;

    MoodService::delete(&state.db, id).await?;
    Ok(Json(json!({ "message": "mood entry deleted" })))
}
