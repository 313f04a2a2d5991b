use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleItemRequest {
    pub title: String,
    pub day_of_week: i16,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub location: Option<String>,
}

impl CreateScheduleItemRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err("day_of_week must be between 0 and 6".into());
        }
        if self.starts_at >= self.ends_at {
            return Err("starts_at must be before ends_at".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleItemRequest {
    pub title: Option<String>,
    pub day_of_week: Option<i16>,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(day: i16, start: &str, end: &str) -> CreateScheduleItemRequest {
        CreateScheduleItemRequest {
            title: "Math".into(),
            day_of_week: day,
            starts_at: start.parse().unwrap(),
            ends_at: end.parse().unwrap(),
            location: None,
        }
    }

    #[test]
    fn validates_day_and_time_window() {
        assert!(req(0, "09:00:00", "10:00:00").validate().is_ok());
        assert!(req(7, "09:00:00", "10:00:00").validate().is_err());
        assert!(req(3, "10:00:00", "09:00:00").validate().is_err());
        assert!(req(3, "09:00:00", "09:00:00").validate().is_err());
    }
}
