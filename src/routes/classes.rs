use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    access::{self, Principal, Requirement},
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::class::{
        Class, ClassEnrollment, CreateClassRequest, DirectEnrollRequest, EnrollByCodeRequest,
        RosterEntry, SetEnrollmentStatusRequest,
    },
    models::user::Role,
    services::classes::ClassService,
    AppState,
};

/// The creating teacher becomes the owning teacher.
pub async fn create_class(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<CreateClassRequest>,
) -> Result<(StatusCode, Json<Class>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Teacher]).no_admin_override(),
    )
    .await?;

    let class = ClassService::create(&state.db, principal.id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

pub async fn list_classes(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<Class>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let classes = ClassService::list_for(&state.db, principal.id, principal.role).await?;
    Ok(Json(classes))
}

/// Visible to the owning teacher, enrolled students, and admins.
pub async fn get_class(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Class>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let class = ClassService::get(&state.db, id).await?;

    let as_teacher = Requirement::roles(&[Role::Teacher]).for_class(id);
    if access::authorize(&state.db, &principal, &as_teacher).await? {
        return Ok(Json(class));
    }
    if principal.role == Role::Student
        && ClassService::is_actively_enrolled(&state.db, principal.id, id).await?
    {
        return Ok(Json(class));
    }
    Err(ApiError::NotAuthorized)
}

/// Roster is for the owning teacher (or admin); a non-owning teacher is
/// refused.
pub async fn list_students(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Teacher]).for_class(id),
    )
    .await?;

    ClassService::get(&state.db, id).await?;
    let roster = ClassService::roster(&state.db, id).await?;
    Ok(Json(roster))
}

/// Student self-enrollment by join code. The admin override is off: this
/// operation enrolls the caller, and only students can be enrolled.
pub async fn enroll_by_code(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<EnrollByCodeRequest>,
) -> Result<(StatusCode, Json<ClassEnrollment>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Student]).no_admin_override(),
    )
    .await?;

    let enrollment = ClassService::enroll_by_code(&state.db, principal.id, &body.class_code).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Direct enrollment by the owning teacher or an admin.
pub async fn direct_enroll(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DirectEnrollRequest>,
) -> Result<(StatusCode, Json<ClassEnrollment>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Teacher]).for_class(id),
    )
    .await?;

    let enrollment = ClassService::direct_enroll(&state.db, body.student_id, id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn set_enrollment_status(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<SetEnrollmentStatusRequest>,
) -> Result<Json<ClassEnrollment>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Teacher]).for_class(id),
    )
    .await?;

    let enrollment =
        ClassService::set_enrollment_status(&state.db, id, student_id, body.status).await?;
    Ok(Json(enrollment))
}
