use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level error taxonomy. Every handler returns `Result<_, ApiError>`;
/// the `IntoResponse` impl maps each variant to a status code and the
/// `{"error": "..."}` envelope the clients expect.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    NotAuthenticated,

    #[error("access denied")]
    NotAuthorized,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// The store or another upstream collaborator failed. The inner error is
    /// logged, never serialized into the response body.
    #[error("internal error")]
    Upstream(anyhow::Error),
}

impl ApiError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotAuthorized => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Upstream(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Upstream(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream(ref e) = self {
            tracing::error!("upstream failure: {e:#}");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Maps a unique-constraint violation on `constraint` to `Conflict(msg)`,
/// leaving every other error untouched. Used by the insert-or-conflict
/// branches for link requests and enrollments.
pub fn on_unique_violation(e: sqlx::Error, constraint: &str, msg: &str) -> ApiError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() && db.constraint() == Some(constraint) {
            return ApiError::conflict(msg);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotAuthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("dup").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_message_is_generic() {
        let e = ApiError::Upstream(anyhow::anyhow!("connection refused to db://secret-host"));
        assert_eq!(e.to_string(), "internal error");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let e: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
    }

    /// Minimal database error carrying a unique-violation kind and a
    /// constraint name, standing in for what the Postgres driver reports.
    #[derive(Debug)]
    struct StubDbError {
        constraint: &'static str,
        unique: bool,
    }

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::ForeignKeyViolation
            }
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn db_error(constraint: &'static str, unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError { constraint, unique }))
    }

    #[test]
    fn duplicate_link_request_maps_to_conflict() {
        let e = on_unique_violation(
            db_error("parent_child_links_live_pair", true),
            "parent_child_links_live_pair",
            "a link request for this child already exists",
        );
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.to_string(), "a link request for this child already exists");
    }

    #[test]
    fn other_constraints_fall_through_to_upstream() {
        // Unique violation on a different constraint is not this conflict.
        let e = on_unique_violation(
            db_error("users_email_key", true),
            "parent_child_links_live_pair",
            "a link request for this child already exists",
        );
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // Matching constraint name but a non-unique error kind as well.
        let e = on_unique_violation(
            db_error("parent_child_links_live_pair", false),
            "parent_child_links_live_pair",
            "a link request for this child already exists",
        );
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
