//! Deterministic test doubles for the model, grader and retrieval ports
//!
//! Every double records what it was asked, so tests can assert on the
//! exact messages and requests a graph run produced.

use crate::errors::{RagError, Result};
use crate::models::{ChatMessage, ChatModel, ModelReply};
use crate::rag::retrieval::{rank_and_truncate, RetrievalRequest, Retriever, ScoredFragment};
use crate::rag::RelevanceGrader;
use crate::tools::ToolSchema;
use crate::types::DocumentGrade;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Chat model replaying scripted replies in order
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<ModelReply>>>,
    structured: Arc<Mutex<VecDeque<serde_json::Value>>>,
    default_reply: Option<ModelReply>,
    invocations: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    structured_invocations: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    offered_tools: Arc<Mutex<Vec<Vec<String>>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text-mode replies, consumed one per `invoke`
    pub fn with_replies(self, replies: Vec<ModelReply>) -> Self {
        lock(&self.replies).extend(replies);
        self
    }

    /// Structured-mode values, consumed one per `invoke_structured`
    pub fn with_structured(self, values: Vec<serde_json::Value>) -> Self {
        lock(&self.structured).extend(values);
        self
    }

    /// Reply used once the text-mode script is exhausted
    pub fn with_default_reply(mut self, reply: ModelReply) -> Self {
        self.default_reply = Some(reply);
        self
    }

    /// Make every call fail with `ModelApiError`
    pub fn set_should_fail(&self, should_fail: bool) {
        *lock(&self.should_fail) = should_fail;
    }

    /// Total calls in either mode
    pub fn call_count(&self) -> usize {
        lock(&self.invocations).len() + lock(&self.structured_invocations).len()
    }

    /// Messages of each text-mode call, in order
    pub fn invocations(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.invocations).clone()
    }

    /// Messages of each structured-mode call, in order
    pub fn structured_invocations(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.structured_invocations).clone()
    }

    /// Tool names offered on each text-mode call
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        lock(&self.offered_tools).clone()
    }

    fn check_failure(&self) -> Result<()> {
        if *lock(&self.should_fail) {
            return Err(RagError::ModelApiError("scripted model failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn invoke(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ModelReply> {
        lock(&self.invocations).push(messages.to_vec());
        lock(&self.offered_tools).push(tools.iter().map(|t| t.name.clone()).collect());
        self.check_failure()?;

        lock(&self.replies)
            .pop_front()
            .or_else(|| self.default_reply.clone())
            .ok_or_else(|| RagError::ModelApiError("script exhausted".to_string()))
    }

    async fn invoke_structured(
        &self,
        messages: &[ChatMessage],
        _shape: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        lock(&self.structured_invocations).push(messages.to_vec());
        self.check_failure()?;

        lock(&self.structured)
            .pop_front()
            .ok_or_else(|| RagError::ModelApiError("structured script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Grader returning a fixed sequence of verdicts; the last one repeats
#[derive(Clone)]
pub struct FixedGrader {
    verdicts: Arc<Mutex<VecDeque<bool>>>,
    last: bool,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FixedGrader {
    /// Same verdict for every call
    pub fn always(is_relevant: bool) -> Self {
        Self::sequence(vec![is_relevant])
    }

    /// Verdicts in order; an empty sequence grades everything irrelevant
    pub fn sequence(verdicts: Vec<bool>) -> Self {
        let last = verdicts.last().copied().unwrap_or(false);
        Self {
            verdicts: Arc::new(Mutex::new(verdicts.into())),
            last,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(question, context)` of each call, in order
    pub fn calls(&self) -> Vec<(String, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RelevanceGrader for FixedGrader {
    async fn grade(&self, question: &str, context: &str) -> Result<DocumentGrade> {
        lock(&self.calls).push((question.to_string(), context.to_string()));

        let is_relevant = {
            let mut verdicts = lock(&self.verdicts);
            if verdicts.len() > 1 {
                verdicts.pop_front().unwrap_or(false)
            } else {
                verdicts.front().copied().unwrap_or(self.last)
            }
        };

        Ok(DocumentGrade { is_relevant })
    }
}

/// Retriever serving a fixed fragment list
#[derive(Clone, Default)]
pub struct StaticRetriever {
    fragments: Vec<ScoredFragment>,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<RetrievalRequest>>>,
}

impl StaticRetriever {
    /// Serve `fragments`, ranked by score, truncated to each request's `top_k`
    pub fn new(fragments: Vec<ScoredFragment>) -> Self {
        Self {
            fragments,
            ..Self::default()
        }
    }

    /// Fail every request with `RetrievalError(message)`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<RetrievalRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<ScoredFragment>> {
        lock(&self.requests).push(request.clone());

        if let Some(message) = &self.failure {
            return Err(RagError::RetrievalError(message.clone()));
        }

        Ok(rank_and_truncate(self.fragments.clone(), request.top_k))
    }

    fn name(&self) -> &str {
        "static"
    }
}
