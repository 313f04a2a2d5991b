use sqlx::PgPool;
use uuid::Uuid;

/// Fire-and-forget audit log entry for privileged admin actions (role
/// assignment, reconciliation). Spawns a background task — never blocks the
/// request handler, never propagates errors (logs a warning on failure).
pub fn log(pool: PgPool, user_id: Option<Uuid>, action: &str, detail: Option<String>) {
    let action = action.to_string();

    tokio::spawn(async move {
        let res = sqlx::query(
            "INSERT INTO audit_log (user_id, action, detail) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&action)
        .bind(detail)
        .execute(&pool)
        .await;

        if let Err(e) = res {
            tracing::warn!("audit log insert failed for action {action}: {e}");
        }
    });
}
