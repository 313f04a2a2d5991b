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
    models::link::{
        CreateLinkRequest, LinkStatus, LinkWithNames, ParentChildLink, RespondLinkRequest,
    },
    models::user::Role,
    services::links::LinkService,
    AppState,
};

/// A parent requests a link to a child account by email.
pub async fn create_link(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ParentChildLink>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::roles(&[Role::Parent])).await?;

    let link = LinkService::request(&state.db, principal.id, &body.child_email).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Links where the caller appears on either side.
pub async fn list_links(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<LinkWithNames>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::any_role()).await?;

    let links = LinkService::list_for(&state.db, principal.id).await?;
    Ok(Json(links))
}

/// Only the linked child answers a pending request; the identity check on
/// the row itself lives in the service and applies to admins too.
pub async fn respond_link(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RespondLinkRequest>,
) -> Result<Json<ParentChildLink>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::roles(&[Role::Student])).await?;

    let link = LinkService::respond(&state.db, id, principal.id, body.approve).await?;
    Ok(Json(link))
}

/// A parent may withdraw their own pending or rejected request (which frees
/// the pair for a new request). Approved links are dissolved only by an
/// admin.
pub async fn delete_link(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Parent]),
    )
    .await?;

    let link = LinkService::get(&state.db, id).await?;
    if principal.role != Role::Admin {
        access::ensure_owner(&principal, link.parent_id)?;
        if link.status == LinkStatus::Approved.to_string() {
            return Err(ApiError::conflict(
                "approved links can only be removed by an admin",
            ));
        }
    }

    LinkService::delete(&state.db, id).await?;
    Ok(Json(json!({ "message": "link removed" })))
}
