use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One row per counterpart in the conversations overview.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationSummary {
    pub counterpart_id: Uuid,
    pub counterpart_name: String,
    pub last_body: String,
    pub last_at: DateTime<Utc>,
    pub unread: i64,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PaginationQuery {
    pub fn per_page(&self) -> i64 {
        i64::from(self.per_page.unwrap_or(50).min(200))
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.unwrap_or(1).saturating_sub(1)) * self.per_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_caps() {
        let q = PaginationQuery { page: None, per_page: None };
        assert_eq!(q.per_page(), 50);
        assert_eq!(q.offset(), 0);

        let q = PaginationQuery { page: Some(3), per_page: Some(1000) };
        assert_eq!(q.per_page(), 200);
        assert_eq!(q.offset(), 400);
    }
}
