use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{on_unique_violation, ApiError};
use crate::models::user::{UpdateProfileRequest, User};

pub struct UserService;

impl UserService {
    pub async fn get(pool: &PgPool, user_id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active = TRUE")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(ApiError::NotFound)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE is_active = TRUE ORDER BY display_name",
        )
        .fetch_all(pool)
        .await?;
        Ok(users)
    }

    /// Profile fields only — the role is never writable here.
    pub async fn update_profile(
        pool: &PgPool,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        let email = match &req.email {
            Some(e) => {
                let e = e.trim().to_lowercase();
                if !e.contains('@') {
                    return Err(ApiError::validation("invalid email"));
                }
                Some(e)
            }
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET display_name = COALESCE($1, display_name),
                 email        = COALESCE($2, email),
                 updated_at   = NOW()
             WHERE id = $3 AND is_active = TRUE
             RETURNING *",
        )
        .bind(&req.display_name)
        .bind(email)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| on_unique_violation(e, "users_email_key", "email already in use"))?;
        user.ok_or(ApiError::NotFound)
    }
}
