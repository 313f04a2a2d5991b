use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Approved => "approved",
            EnrollmentStatus::Rejected => "rejected",
            EnrollmentStatus::Withdrawn => "withdrawn",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EnrollmentStatus::Pending),
            "approved" => Ok(EnrollmentStatus::Approved),
            "rejected" => Ok(EnrollmentStatus::Rejected),
            "withdrawn" => Ok(EnrollmentStatus::Withdrawn),
            _ => Err(anyhow::anyhow!("Unknown enrollment status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub class_code: String,
    /// Owning teacher; the single id consulted by authorization.
    pub teacher_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassEnrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Roster row: enrollment joined with the student's profile fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RosterEntry {
    pub student_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollByCodeRequest {
    pub class_code: String,
}

#[derive(Debug, Deserialize)]
pub struct DirectEnrollRequest {
    pub student_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SetEnrollmentStatusRequest {
    pub status: EnrollmentStatus,
}
