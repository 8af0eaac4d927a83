use anyhow::Context;
use tracing::{error, info};

use super::repo_types::CodeAnalysis;
use crate::{error::AppError, state::AppState};

/// Stores the submission, runs the analyzer and stores its result, all in
/// one transaction. An early return drops the transaction, rolling back.
pub async fn analyze_code(
    state: &AppState,
    user_id: i64,
    code: String,
) -> Result<CodeAnalysis, AppError> {
    if code.trim().is_empty() {
        return Err(AppError::Validation("code: must not be empty".into()));
    }

    let mut tx = state.store.begin().await?;
    let submission = tx.insert_submission(user_id, &code).await?;
    info!(user_id, submission_id = submission.id, "code submitted");

    let results = state
        .analyzer
        .analyze(&code)
        .await
        .map_err(|e| {
            error!(error = ?e, submission_id = submission.id, "analyzer failed");
            e
        })
        .context("analyze code")?;

    let analysis = tx
        .insert_analysis(submission.id, &results, state.analyzer.model())
        .await?;
    tx.commit().await?;

    info!(
        submission_id = submission.id,
        analysis_id = analysis.id,
        model = %analysis.model_used,
        "analysis stored"
    );
    Ok(analysis)
}
