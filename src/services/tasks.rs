use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::task::{CreateTaskRequest, Task, UpdateTaskRequest};

pub struct TaskService;

impl TaskService {
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Task>, ApiError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = $1
             ORDER BY completed, due_date NULLS LAST, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(tasks)
    }

    /// Shared tasks attached to a class, readable by the class context.
    pub async fn list_shared_for_class(
        pool: &PgPool,
        class_id: Uuid,
    ) -> Result<Vec<Task>, ApiError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks
             WHERE class_id = $1 AND is_shared = TRUE
             ORDER BY due_date NULLS LAST, created_at DESC",
        )
        .bind(class_id)
        .fetch_all(pool)
        .await?;
        Ok(tasks)
    }

    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        req: &CreateTaskRequest,
    ) -> Result<Task, ApiError> {
        if req.title.trim().is_empty() {
            return Err(ApiError::validation("title is required"));
        }
        if req.is_shared && req.class_id.is_none() {
            return Err(ApiError::validation("a shared task needs a class_id"));
        }

        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (user_id, title, description, due_date, is_shared, class_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(user_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.is_shared)
        .bind(req.class_id)
        .fetch_one(pool)
        .await?;
        Ok(task)
    }

    pub async fn get(pool: &PgPool, task_id: Uuid) -> Result<Task, ApiError> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Plain row update. The ownership check against the current row happens
    /// in the handler before this is called. COALESCE semantics: omitted
    /// fields keep their value, and class_id cannot be cleared back to NULL
    /// through this path — un-sharing is done via is_shared = false, which
    /// alone removes the task from every class listing.
    pub async fn update(
        pool: &PgPool,
        task_id: Uuid,
        req: &UpdateTaskRequest,
    ) -> Result<Task, ApiError> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks
             SET title       = COALESCE($1, title),
                 description = COALESCE($2, description),
                 due_date    = COALESCE($3, due_date),
                 completed   = COALESCE($4, completed),
                 is_shared   = COALESCE($5, is_shared),
                 class_id    = COALESCE($6, class_id),
                 updated_at  = NOW()
             WHERE id = $7
             RETURNING *",
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.due_date)
        .bind(req.completed)
        .bind(req.is_shared)
        .bind(req.class_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
        task.ok_or(ApiError::NotFound)
    }

    pub async fn delete(pool: &PgPool, task_id: Uuid) -> Result<(), ApiError> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
