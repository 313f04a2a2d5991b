use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    access::{self, Principal, Requirement},
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::user::{UpdateProfileRequest, UserProfile},
    services::users::UserService,
    AppState,
};

/// Readable by the user themselves, an approved parent/child counterpart,
/// or an admin.
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::any_role().for_user(id)).await?;

    let user = UserService::get(&state.db, id).await?;
    Ok(Json(UserProfile::try_from(user)?))
}

/// Profile edits are self-or-admin only; an approved link does not extend
/// to writing the counterpart's profile. The role field has no edit path
/// here at all.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let req = Requirement::any_role().custom_check(move |p| p.id == id);
    access::require(&state.db, &principal, &req).await?;

    let user = UserService::update_profile(&state.db, id, &body).await?;
    Ok(Json(UserProfile::try_from(user)?))
}
