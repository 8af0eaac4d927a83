use async_trait::async_trait;
use serde_json::json;

/// The model behind `/code/analyze`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Identifier persisted next to every result.
    fn model(&self) -> &str;
    async fn analyze(&self, code: &str) -> anyhow::Result<serde_json::Value>;
}

/// Stand-in until a real model is wired up. Deterministic, no I/O.
#[derive(Debug, Clone, Default)]
pub struct MockAnalyzer;

pub const MOCK_MODEL: &str = "mock-reviewer-v0";

#[async_trait]
impl Analyzer for MockAnalyzer {
    fn model(&self) -> &str {
        MOCK_MODEL
    }

    async fn analyze(&self, code: &str) -> anyhow::Result<serde_json::Value> {
        let lines = code.lines().count();
        let long_lines: Vec<usize> = code
            .lines()
            .enumerate()
            .filter(|(_, l)| l.chars().count() > 100)
            .map(|(i, _)| i + 1)
            .collect();
        let todos = code.lines().filter(|l| l.contains("TODO")).count();

        let mut suggestions = Vec::new();
        if !long_lines.is_empty() {
            suggestions.push(format!(
                "Consider wrapping lines longer than 100 characters: {long_lines:?}"
            ));
        }
        if todos > 0 {
            suggestions.push(format!("Resolve {todos} TODO comment(s)."));
        }
        if suggestions.is_empty() {
            suggestions.push("No issues found.".to_string());
        }

        Ok(json!({
            "summary": format!("Mock analysis of {lines} line(s) of code."),
            "line_count": lines,
            "character_count": code.chars().count(),
            "suggestions": suggestions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_reports_basic_metrics() {
        let out = MockAnalyzer
            .analyze("fn main() {}\n// TODO: more\n")
            .await
            .unwrap();
        assert_eq!(out["line_count"], 2);
        assert_eq!(out["suggestions"][0], "Resolve 1 TODO comment(s).");
    }

    #[tokio::test]
    async fn mock_flags_long_lines() {
        let code = format!("ok\n{}\n", "x".repeat(120));
        let out = MockAnalyzer.analyze(&code).await.unwrap();
        let first = out["suggestions"][0].as_str().unwrap();
        assert!(first.contains("[2]"), "{first}");
    }

    #[tokio::test]
    async fn mock_clean_code() {
        let out = MockAnalyzer.analyze("let x = 1;").await.unwrap();
        assert_eq!(out["suggestions"][0], "No issues found.");
        assert_eq!(MockAnalyzer.model(), MOCK_MODEL);
    }
}
