use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::message::{ConversationSummary, Message};

pub struct MessageService;

impl MessageService {
    /// Whether two users stand in a relationship that permits messaging:
    /// an approved parent/child link in either direction, or a teacher/
    /// student pair through an approved enrollment in a class the teacher
    /// owns.
    pub async fn can_message(pool: &PgPool, a: Uuid, b: Uuid) -> Result<bool, ApiError> {
        let linked: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM parent_child_links
                 WHERE status = 'approved'
                   AND ((parent_id = $1 AND child_id = $2)
                     OR (parent_id = $2 AND child_id = $1))
             )",
        )
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await?;
        if linked {
            return Ok(true);
        }

        let share_class: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM classes c
                 JOIN class_enrollments e ON e.class_id = c.id AND e.status = 'approved'
                 WHERE (c.teacher_id = $1 AND e.student_id = $2)
                    OR (c.teacher_id = $2 AND e.student_id = $1)
             )",
        )
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await?;
        Ok(share_class)
    }

    pub async fn send(
        pool: &PgPool,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: &str,
    ) -> Result<Message, ApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ApiError::validation("message body is required"));
        }

        let msg = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, recipient_id, body)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(body)
        .fetch_one(pool)
        .await?;
        Ok(msg)
    }

    /// Both directions of the exchange between two users, newest first.
    pub async fn conversation(
        pool: &PgPool,
        user_id: Uuid,
        counterpart_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, ApiError> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages
             WHERE (sender_id = $1 AND recipient_id = $2)
                OR (sender_id = $2 AND recipient_id = $1)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(counterpart_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    /// One row per counterpart with the latest message and the unread count.
    pub async fn conversations(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, ApiError> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            "SELECT DISTINCT ON (counterpart_id)
                    counterpart_id,
                    u.display_name AS counterpart_name,
                    m.body AS last_body,
                    m.created_at AS last_at,
                    (SELECT COUNT(*) FROM messages
                     WHERE recipient_id = $1 AND sender_id = counterpart_id
                       AND read_at IS NULL) AS unread
             FROM (
                 SELECT *,
                        CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END
                            AS counterpart_id
                 FROM messages
                 WHERE sender_id = $1 OR recipient_id = $1
             ) m
             JOIN users u ON u.id = counterpart_id
             ORDER BY counterpart_id, m.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(summaries)
    }

    /// Marks a message read. Only the recipient may do so; anyone else gets
    /// the same `NotFound` as for a nonexistent id.
    pub async fn mark_read(
        pool: &PgPool,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Message, ApiError> {
        let msg = sqlx::query_as::<_, Message>(
            "UPDATE messages
             SET read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND recipient_id = $2
             RETURNING *",
        )
        .bind(message_id)
        .bind(recipient_id)
        .fetch_optional(pool)
        .await?;
        msg.ok_or(ApiError::NotFound)
    }
}
