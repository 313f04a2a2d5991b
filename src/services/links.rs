use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{on_unique_violation, ApiError};
use crate::models::link::{LinkStatus, LinkWithNames, ParentChildLink};

pub struct LinkService;

impl LinkService {
    /// Relationship query used by the access validator: only an approved
    /// link grants anything, pending and rejected rows count for nothing.
    pub async fn is_approved_parent_of(
        pool: &PgPool,
        parent_id: Uuid,
        child_id: Uuid,
    ) -> Result<bool, ApiError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM parent_child_links
                 WHERE parent_id = $1 AND child_id = $2 AND status = 'approved'
             )",
        )
        .bind(parent_id)
        .bind(child_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// A parent requests a link to a child account, addressed by email.
    ///
    /// A nonexistent email and an email that does not belong to a student
    /// account both come back as the same `NotFound` — the response must not
    /// reveal which addresses exist. Duplicate requests are rejected by the
    /// partial unique index, not by a read-before-write.
    pub async fn request(
        pool: &PgPool,
        parent_id: Uuid,
        child_email: &str,
    ) -> Result<ParentChildLink, ApiError> {
        let child: Option<Uuid> = sqlx::query_scalar(
            "SELECT u.id FROM users u
             JOIN user_roles r ON r.user_id = u.id
             WHERE u.email = $1 AND u.is_active = TRUE AND r.role = 'student'",
        )
        .bind(child_email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

        let Some(child_id) = child else {
            return Err(ApiError::NotFound);
        };
        if child_id == parent_id {
            return Err(ApiError::NotFound);
        }

        let link = sqlx::query_as::<_, ParentChildLink>(
            "INSERT INTO parent_child_links (parent_id, child_id)
             VALUES ($1, $2)
             RETURNING *",
        )
        .bind(parent_id)
        .bind(child_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            on_unique_violation(
                e,
                "parent_child_links_live_pair",
                "a link request for this child already exists",
            )
        })?;
        Ok(link)
    }

    pub async fn get(pool: &PgPool, link_id: Uuid) -> Result<ParentChildLink, ApiError> {
        let link = sqlx::query_as::<_, ParentChildLink>(
            "SELECT * FROM parent_child_links WHERE id = $1",
        )
        .bind(link_id)
        .fetch_optional(pool)
        .await?;
        link.ok_or(ApiError::NotFound)
    }

    /// The linked child approves or rejects a pending request. Only the
    /// child named on the row may respond, and only while it is pending.
    pub async fn respond(
        pool: &PgPool,
        link_id: Uuid,
        child_id: Uuid,
        approve: bool,
    ) -> Result<ParentChildLink, ApiError> {
        let link = Self::get(pool, link_id).await?;
        if link.child_id != child_id {
            return Err(ApiError::NotAuthorized);
        }
        if link.status != LinkStatus::Pending.to_string() {
            return Err(ApiError::conflict("link request has already been answered"));
        }

        let status = if approve { LinkStatus::Approved } else { LinkStatus::Rejected };
        let link = sqlx::query_as::<_, ParentChildLink>(
            "UPDATE parent_child_links
             SET status = $1, responded_at = $2
             WHERE id = $3 AND status = 'pending'
             RETURNING *",
        )
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(link_id)
        .fetch_optional(pool)
        .await?
        // A concurrent response won the race between our read and write.
        .ok_or_else(|| ApiError::conflict("link request has already been answered"))?;
        Ok(link)
    }

    pub async fn delete(pool: &PgPool, link_id: Uuid) -> Result<(), ApiError> {
        let res = sqlx::query("DELETE FROM parent_child_links WHERE id = $1")
            .bind(link_id)
            .execute(pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }

    /// All links where the user appears on either side, with display names
    /// for rendering.
    pub async fn list_for(pool: &PgPool, user_id: Uuid) -> Result<Vec<LinkWithNames>, ApiError> {
        let links = sqlx::query_as::<_, LinkWithNames>(
            "SELECT l.id, l.parent_id, p.display_name AS parent_name,
                    l.child_id, c.display_name AS child_name,
                    l.status, l.created_at, l.responded_at
             FROM parent_child_links l
             JOIN users p ON p.id = l.parent_id
             JOIN users c ON c.id = l.child_id
             WHERE l.parent_id = $1 OR l.child_id = $1
             ORDER BY l.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(links)
    }
}
