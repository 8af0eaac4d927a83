use serde::{Deserialize, Serialize};

use super::repo_types::CodeAnalysis;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: i64,
    pub submission_id: i64,
    pub analysis_results: serde_json::Value,
    pub model_used: String,
}

impl From<CodeAnalysis> for AnalysisResponse {
    fn from(a: CodeAnalysis) -> Self {
        Self {
            id: a.id,
            submission_id: a.submission_id,
            analysis_results: a.analysis_results,
            model_used: a.model_used,
        }
    }
}
