use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AnalysisResponse, AnalyzeRequest},
    services::analyze_code,
};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

pub fn code_routes() -> Router<AppState> {
    Router::new().route("/code/analyze", post(analyze))
}

#[instrument(skip_all)]
pub async fn analyze(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let Json(payload) = payload?;
    let analysis = analyze_code(&state, user.id, payload.code).await?;
    Ok((StatusCode::CREATED, Json(analysis.into())))
}
