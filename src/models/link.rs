use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Approved => "approved",
            LinkStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LinkStatus::Pending),
            "approved" => Ok(LinkStatus::Approved),
            "rejected" => Ok(LinkStatus::Rejected),
            _ => Err(anyhow::anyhow!("Unknown link status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParentChildLink {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub child_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Link row joined with the counterpart's name for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LinkWithNames {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub parent_name: String,
    pub child_id: Uuid,
    pub child_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    /// Email of the child account to link to.
    pub child_email: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondLinkRequest {
    pub approve: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [LinkStatus::Pending, LinkStatus::Approved, LinkStatus::Rejected] {
            let parsed: LinkStatus = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }

    // Only the approved state may ever grant access; the string forms the
    // relationship queries filter on must stay in sync with the DB CHECK.
    #[test]
    fn approved_is_the_only_granting_state() {
        assert_eq!(LinkStatus::Approved.to_string(), "approved");
        assert_ne!(LinkStatus::Pending.to_string(), "approved");
        assert_ne!(LinkStatus::Rejected.to_string(), "approved");
    }
}
