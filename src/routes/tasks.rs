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
    models::task::{CreateTaskRequest, Task, UpdateTaskRequest},
    models::user::Role,
    services::classes::ClassService,
    services::tasks::TaskService,
    AppState,
};

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<Task>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let tasks = TaskService::list_for_user(&state.db, principal.id).await?;
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;

    // Publishing a task into a class context requires owning that class.
    if body.is_shared {
        let class_id = body
            .class_id
            .ok_or_else(|| ApiError::validation("a shared task needs a class_id"))?;
        access::require(
            &state.db,
            &principal,
            &Requirement::roles(&[Role::Teacher]).for_class(class_id),
        )
        .await?;
    }

    let task = TaskService::create(&state.db, principal.id, &body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Readable by the owner, an approved parent/child counterpart of the
/// owner, the class context when shared, or an admin.
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let task = TaskService::get(&state.db, id).await?;

    let as_counterpart = Requirement::any_role().for_user(task.user_id);
    if access::authorize(&state.db, &principal, &as_counterpart).await? {
        return Ok(Json(task));
    }

    if task.is_shared {
        if let Some(class_id) = task.class_id {
            if ClassService::is_owning_teacher_of(&state.db, principal.id, class_id).await?
                || ClassService::is_actively_enrolled(&state.db, principal.id, class_id).await?
            {
                return Ok(Json(task));
            }
        }
    }
    Err(ApiError::NotAuthorized)
}

/// A parent's view of a child's tasks; requires an approved link.
pub async fn list_user_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    access::require(
        &state.db,
        &principal,
        &Requirement::roles(&[Role::Parent]).for_child(user_id),
    )
    .await?;

    let tasks = TaskService::list_for_user(&state.db, user_id).await?;
    Ok(Json(tasks))
}

/// Shared tasks of a class, for its owning teacher, enrolled students and
/// admins.
pub async fn list_class_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(class_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    ClassService::get(&state.db, class_id).await?;

    let as_teacher = Requirement::roles(&[Role::Teacher]).for_class(class_id);
    let allowed = access::authorize(&state.db, &principal, &as_teacher).await?
        || (principal.role == Role::Student
            && ClassService::is_actively_enrolled(&state.db, principal.id, class_id).await?);
    if !allowed {
        return Err(ApiError::NotAuthorized);
    }

    let tasks = TaskService::list_shared_for_class(&state.db, class_id).await?;
    Ok(Json(tasks))
}

/// Determines whether an update publishes the task into a class context
/// and, if so, which class the caller must own. Covers both turning
/// sharing on and re-pointing an already-shared task at another class;
/// updates that leave the published state untouched need no re-check.
fn class_share_target(task: &Task, req: &UpdateTaskRequest) -> Result<Option<Uuid>, ApiError> {
    let shared_after = req.is_shared.unwrap_or(task.is_shared);
    if !shared_after {
        return Ok(None);
    }
    let Some(class_id) = req.class_id.or(task.class_id) else {
        return Err(ApiError::validation("a shared task needs a class_id"));
    };
    let turns_sharing_on = req.is_shared == Some(true) && !task.is_shared;
    let changes_class = req.class_id.is_some() && req.class_id != task.class_id;
    if turns_sharing_on || changes_class {
        Ok(Some(class_id))
    } else {
        Ok(None)
    }
}

/// Mutations re-check ownership against the current row; the role gate
/// alone is never enough. Sharing into a class goes through the same
/// class-ownership gate as `create_task`, evaluated against the
/// post-update values.
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let task = TaskService::get(&state.db, id).await?;
    access::ensure_owner(&principal, task.user_id)?;

    if let Some(class_id) = class_share_target(&task, &body)? {
        access::require(
            &state.db,
            &principal,
            &Requirement::roles(&[Role::Teacher]).for_class(class_id),
        )
        .await?;
    }

    let task = TaskService::update(&state.db, id, &body).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let task = TaskService::get(&state.db, id).await?;
    access::ensure_owner(&principal, task.user_id)?;

    TaskService::delete(&state.db, id).await?;
    Ok(Json(json!({ "message": "task deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(is_shared: bool, class_id: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Essay draft".into(),
            description: None,
            due_date: None,
            completed: false,
            is_shared,
            class_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn update(is_shared: Option<bool>, class_id: Option<Uuid>) -> UpdateTaskRequest {
        UpdateTaskRequest {
            title: None,
            description: None,
            due_date: None,
            completed: None,
            is_shared,
            class_id,
        }
    }

    // Turning sharing on through the update path must hit the same
    // class-ownership gate as creation; an owner's PUT alone is not enough
    // to publish into a class.
    #[test]
    fn turning_sharing_on_demands_the_class_gate() {
        let class = Uuid::new_v4();
        let target = class_share_target(&task(false, None), &update(Some(true), Some(class)));
        assert_eq!(target.unwrap(), Some(class));

        // Same when the class was already attached to the unshared task.
        let target = class_share_target(&task(false, Some(class)), &update(Some(true), None));
        assert_eq!(target.unwrap(), Some(class));
    }

    #[test]
    fn repointing_a_shared_task_demands_the_gate_for_the_new_class() {
        let old_class = Uuid::new_v4();
        let new_class = Uuid::new_v4();
        let target =
            class_share_target(&task(true, Some(old_class)), &update(None, Some(new_class)));
        assert_eq!(target.unwrap(), Some(new_class));
    }

    #[test]
    fn untouched_published_state_needs_no_recheck() {
        let class = Uuid::new_v4();
        // Title-only edit of an already-shared task.
        let target = class_share_target(&task(true, Some(class)), &update(None, None));
        assert_eq!(target.unwrap(), None);
        // Redundant is_shared=true with the same class.
        let target = class_share_target(&task(true, Some(class)), &update(Some(true), Some(class)));
        assert_eq!(target.unwrap(), None);
    }

    #[test]
    fn unsharing_needs_no_gate() {
        let class = Uuid::new_v4();
        let target = class_share_target(&task(true, Some(class)), &update(Some(false), None));
        assert_eq!(target.unwrap(), None);
    }

    #[test]
    fn sharing_without_a_class_is_invalid() {
        let res = class_share_target(&task(false, None), &update(Some(true), None));
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }
}
