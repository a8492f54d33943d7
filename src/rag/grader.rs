//! Relevance grading
//!
//! The grading branch asks a model, in structured mode, whether the
//! latest retrieved content answers the original question. The verdict
//! must be exactly `{"is_relevant": <bool>}`; anything else is a
//! contract violation.

use crate::errors::{RagError, Result};
use crate::models::ChatModel;
use crate::rag::prompts;
use crate::types::DocumentGrade;
use async_trait::async_trait;
use std::sync::Arc;

/// Judges retrieved content against a question
#[async_trait]
pub trait RelevanceGrader: Send + Sync {
    async fn grade(&self, question: &str, context: &str) -> Result<DocumentGrade>;
}

/// Grader backed by a chat model in structured mode
pub struct ModelGrader {
    model: Arc<dyn ChatModel>,
}

impl ModelGrader {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Check a structured value against the `DocumentGrade` shape
    pub fn parse_grade(value: serde_json::Value) -> Result<DocumentGrade> {
        serde_json::from_value::<DocumentGrade>(value.clone()).map_err(|e| {
            RagError::ContractViolation(format!(
                "grade does not match {{is_relevant: bool}} ({}): {}",
                e, value
            ))
        })
    }
}

#[async_trait]
impl RelevanceGrader for ModelGrader {
    async fn grade(&self, question: &str, context: &str) -> Result<DocumentGrade> {
        let messages = prompts::grade_messages(question, context);
        let value = self
            .model
            .invoke_structured(&messages, &DocumentGrade::json_schema())
            .await?;
        Self::parse_grade(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_model_grader_parses_verdict() {
        let model = Arc::new(ScriptedModel::new().with_structured(vec![
            json!({"is_relevant": true}),
            json!({"is_relevant": false}),
        ]));
        let grader = ModelGrader::new(model.clone());

        assert!(grader.grade("q", "ctx").await.unwrap().is_relevant);
        assert!(!grader.grade("q", "ctx").await.unwrap().is_relevant);

        let sent = model.structured_invocations();
        assert_eq!(sent.len(), 2);
        assert!(sent[0][0].content.contains("ctx"));
    }

    #[tokio::test]
    async fn test_non_conforming_value_is_contract_violation() {
        let model = Arc::new(ScriptedModel::new().with_structured(vec![json!({"is_relevant": "yes"})]));
        let grader = ModelGrader::new(model);

        let err = grader.grade("q", "ctx").await.unwrap_err();
        assert!(matches!(err, RagError::ContractViolation(_)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = Arc::new(ScriptedModel::new());
        model.set_should_fail(true);
        let grader = ModelGrader::new(model);

        let err = grader.grade("q", "ctx").await.unwrap_err();
        assert!(err.is_dependency_failure());
    }
}
