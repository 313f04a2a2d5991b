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
    models::user::{ReconcileReport, Role, SetRoleRequest, UserProfile},
    services::{audit, roles::RoleService, users::UserService},
    AppState,
};

const ADMIN_ONLY: &[Role] = &[Role::Admin];

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::roles(ADMIN_ONLY)).await?;

    let users = UserService::list(&state.db).await?;
    let profiles = users
        .into_iter()
        .map(UserProfile::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(profiles))
}

/// The only path that changes a role. Writes the role store and the
/// denormalized copy in one transaction, and leaves an audit trail.
pub async fn set_role(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<Value>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::roles(ADMIN_ONLY)).await?;

    RoleService::assign(&state.db, id, body.role).await?;
    audit::log(
        state.db.clone(),
        Some(principal.id),
        "role.assign",
        Some(format!("user={id} role={}", body.role)),
    );
    Ok(Json(json!({ "message": "role updated" })))
}

/// Repairs users.role from the role store. An explicit, audited admin
/// action — never run ambiently.
pub async fn reconcile_roles(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ReconcileReport>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(&state.db, &principal, &Requirement::roles(ADMIN_ONLY)).await?;

    let report = RoleService::reconcile(&state.db).await?;
    tracing::info!(
        scanned = report.scanned,
        repaired = report.repaired,
        "role reconciliation completed"
    );
    audit::log(
        state.db.clone(),
        Some(principal.id),
        "role.reconcile",
        Some(format!("scanned={} repaired={}", report.scanned, report.repaired)),
    );
    Ok(Json(report))
}
