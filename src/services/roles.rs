use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::user::{ReconcileReport, Role};

pub struct RoleService;

impl RoleService {
    /// Resolves a user's role from the role store (user_roles). A missing
    /// row is `NotAuthorized`: a user without an explicit role has no
    /// capabilities, there is no fallback role.
    pub async fn resolve(pool: &PgPool, user_id: Uuid) -> Result<Role, ApiError> {
        let row: Option<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        match row {
            Some(s) => s.parse().map_err(ApiError::Upstream),
            None => Err(ApiError::NotAuthorized),
        }
    }

    /// Assigns a role, updating the role store and the denormalized copy on
    /// users in one transaction so the two can never be observed disagreeing.
    pub async fn assign(pool: &PgPool, user_id: Uuid, role: Role) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
            .bind(role.to_string())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }

        sqlx::query(
            "INSERT INTO user_roles (user_id, role)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET role = $2, assigned_at = NOW()",
        )
        .bind(user_id)
        .bind(role.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Repairs drift between user_roles (source of truth) and the
    /// denormalized users.role column. Explicit operator action, never run
    /// in the background.
    pub async fn reconcile(pool: &PgPool) -> Result<ReconcileReport, ApiError> {
        let scanned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles")
            .fetch_one(pool)
            .await?;

        let repaired = sqlx::query(
            "UPDATE users u
             SET role = r.role, updated_at = NOW()
             FROM user_roles r
             WHERE r.user_id = u.id AND u.role <> r.role",
        )
        .execute(pool)
        .await?
        .rows_affected();

        Ok(ReconcileReport {
            scanned: scanned as u64,
            repaired,
        })
    }
}
