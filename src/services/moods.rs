use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::mood::{MoodEntry, UpsertMoodRequest};

pub struct MoodService;

impl MoodService {
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<MoodEntry>, ApiError> {
        let entries = sqlx::query_as::<_, MoodEntry>(
            "SELECT * FROM mood_entries WHERE user_id = $1
             ORDER BY entry_date DESC
             LIMIT 90",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(entries)
    }

    /// One entry per user and day; recording again the same day replaces the
    /// earlier entry.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpsertMoodRequest,
    ) -> Result<MoodEntry, ApiError> {
        let entry = sqlx::query_as::<_, MoodEntry>(
            "INSERT INTO mood_entries (user_id, mood, note, entry_date)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, entry_date)
             DO UPDATE SET mood = $2, note = $3
             RETURNING *",
        )
        .bind(user_id)
        .bind(req.mood.to_string())
        .bind(&req.note)
        .bind(req.entry_date)
        .fetch_one(pool)
        .await?;
        Ok(entry)
    }

    pub async fn get(pool: &PgPool, entry_id: Uuid) -> Result<MoodEntry, ApiError> {
        sqlx::query_as::<_, MoodEntry>("SELECT * FROM mood_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn delete(pool: &PgPool, entry_id: Uuid) -> Result<(), ApiError> {
        let res = sqlx::query("DELETE FROM mood_entries WHERE id = $1")
            .bind(entry_id)
            .execute(pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}
