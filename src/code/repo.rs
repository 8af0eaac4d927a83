use sqlx::{Postgres, Transaction};

use super::repo_types::{CodeAnalysis, CodeSubmission};

impl CodeSubmission {
    /// Insert a submission within a transaction.
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        code: &str,
    ) -> sqlx::Result<CodeSubmission> {
        sqlx::query_as::<_, CodeSubmission>(
            r#"
            INSERT INTO code_submissions (user_id, code)
            VALUES ($1, $2)
            RETURNING id, user_id, code, created_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_one(&mut **tx)
        .await
    }
}

impl CodeAnalysis {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        submission_id: i64,
        analysis_results: &serde_json::Value,
        model_used: &str,
    ) -> sqlx::Result<CodeAnalysis> {
        sqlx::query_as::<_, CodeAnalysis>(
            r#"
            INSERT INTO code_analyses (submission_id, analysis_results, model_used)
            VALUES ($1, $2, $3)
            RETURNING id, submission_id, analysis_results, model_used, created_at
            "#,
        )
        .bind(submission_id)
        .bind(analysis_results)
        .bind(model_used)
        .fetch_one(&mut **tx)
        .await
    }
}
