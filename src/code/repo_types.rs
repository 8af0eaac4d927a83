use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CodeSubmission {
    pub id: i64,
    pub user_id: i64,
    pub code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One per submission (`submission_id` is unique).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CodeAnalysis {
    pub id: i64,
    pub submission_id: i64,
    pub analysis_results: serde_json::Value,
    pub model_used: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
