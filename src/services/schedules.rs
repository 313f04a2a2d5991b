use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::schedule::{CreateScheduleItemRequest, ScheduleItem, UpdateScheduleItemRequest};

pub struct ScheduleService;

impl ScheduleService {
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ScheduleItem>, ApiError> {
        let items = sqlx::query_as::<_, ScheduleItem>(
            "SELECT * FROM schedule_items WHERE user_id = $1
             ORDER BY day_of_week, starts_at",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(items)
    }

    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        req: &CreateScheduleItemRequest,
    ) -> Result<ScheduleItem, ApiError> {
        req.validate().map_err(ApiError::Validation)?;

        let item = sqlx::query_as::<_, ScheduleItem>(
            "INSERT INTO schedule_items (user_id, title, day_of_week, starts_at, ends_at, location)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(user_id)
        .bind(req.title.trim())
        .bind(req.day_of_week)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .bind(&req.location)
        .fetch_one(pool)
        .await?;
        Ok(item)
    }

    pub async fn get(pool: &PgPool, item_id: Uuid) -> Result<ScheduleItem, ApiError> {
        sqlx::query_as::<_, ScheduleItem>("SELECT * FROM schedule_items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// COALESCE semantics: omitted fields keep their value; location cannot
    /// be cleared back to NULL through this path, only overwritten.
    pub async fn update(
        pool: &PgPool,
        item_id: Uuid,
        req: &UpdateScheduleItemRequest,
    ) -> Result<ScheduleItem, ApiError> {
        if let Some(day) = req.day_of_week {
            if !(0..=6).contains(&day) {
                return Err(ApiError::validation("day_of_week must be between 0 and 6"));
            }
        }

        let item = sqlx::query_as::<_, ScheduleItem>(
            "UPDATE schedule_items
             SET title       = COALESCE($1, title),
                 day_of_week = COALESCE($2, day_of_week),
                 starts_at   = COALESCE($3, starts_at),
                 ends_at     = COALESCE($4, ends_at),
                 location    = COALESCE($5, location),
                 updated_at  = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(&req.title)
        .bind(req.day_of_week)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .bind(&req.location)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
        item.ok_or(ApiError::NotFound)
    }

    pub async fn delete(pool: &PgPool, item_id: Uuid) -> Result<(), ApiError> {
        let res = sqlx::query("DELETE FROM schedule_items WHERE id = $1")
            .bind(item_id)
            .execute(pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
