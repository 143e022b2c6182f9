use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use validator::Validate;

use crate::{medications::dto::Medication, triggers::dto::Trigger};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Body for create and for full replacement on update.
#[derive(Debug, Deserialize, Validate)]
pub struct EpisodeRequest {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[validate(range(min = 0, max = 10))]
    pub intensity: i32,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[serde(default)]
    pub trigger_ids: Vec<i64>,
    #[serde(default)]
    pub medication_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EpisodeQuery {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub limit: i64,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
}
fn default_limit() -> i64 { 100 }

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EpisodeRow {
    pub id: i64,
    pub user_id: i64,
    pub date: Date,
    pub intensity: i32,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Episode {
    pub id: i64,
    pub user_id: i64,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub intensity: i32,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub triggers: Vec<Trigger>,
    pub medications: Vec<Medication>,
}

impl Episode {
    pub fn from_row(r: EpisodeRow, triggers: Vec<Trigger>, medications: Vec<Medication>) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            date: r.date,
            intensity: r.intensity,
            duration_minutes: r.duration_minutes,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            triggers,
            medications,
        }
    }
}
