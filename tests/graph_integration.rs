//! Integration tests for the agentic retrieval graph
//!
//! Runs full graph executions against deterministic doubles; no Ollama or
//! Weaviate instance is needed.

use agentic_rag::{
    agent::{GraphConfig, GraphNode, GraphPorts, RagGraph, RunOutcome},
    models::ModelReply,
    rag::{RetrievalRequest, ScoredFragment, INSUFFICIENT_EVIDENCE_ANSWER},
    testing::{FixedGrader, ScriptedModel, StaticRetriever},
    types::{Metadata, MetadataValue, ToolCall, Turn},
    RagError,
};
use serde_json::json;
use std::sync::Arc;

const QUESTION: &str = "What is the refund policy?";

fn refund_fragment() -> ScoredFragment {
    let mut metadata = Metadata::new();
    metadata.insert("file_name".to_string(), MetadataValue::from("policy.pdf"));
    metadata.insert("page_label".to_string(), MetadataValue::from("4"));

    ScoredFragment::new("Refunds are accepted within 30 days.", 0.92)
        .with_metadata(metadata)
}

fn retrieve(query: &str) -> ModelReply {
    ModelReply::tool_call("retrieve", json!({ "query": query }))
}

struct Harness {
    model: Arc<ScriptedModel>,
    retriever: Arc<StaticRetriever>,
    grader: Arc<FixedGrader>,
}

impl Harness {
    fn new(replies: Vec<ModelReply>, fragments: Vec<ScoredFragment>, grader: FixedGrader) -> Self {
        Self {
            model: Arc::new(ScriptedModel::new().with_replies(replies)),
            retriever: Arc::new(StaticRetriever::new(fragments)),
            grader: Arc::new(grader),
        }
    }

    fn graph(&self, config: GraphConfig) -> RagGraph {
        RagGraph::new(
            GraphPorts {
                model: self.model.clone(),
                retriever: self.retriever.clone(),
                grader: self.grader.clone(),
            },
            config,
        )
    }
}

#[tokio::test]
async fn test_relevant_first_retrieval_answers_with_sources() {
    let harness = Harness::new(
        vec![
            retrieve("refund policy"),
            ModelReply::Text("Refunds are accepted within 30 days of purchase.".into()),
        ],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );

    let run = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap();
    assert_eq!(
        run.path,
        vec![GraphNode::Agent, GraphNode::Retrieve, GraphNode::Answer]
    );
    assert_eq!(run.outcome, RunOutcome::Answered);

    let response = run.into_response();
    assert!(response.message.unwrap().contains("30 days"));
    assert!(response.reasoning.is_none());
    assert_eq!(response.sources.len(), 1);
    assert_eq!(
        response.sources[0].metadata.get("file_name"),
        Some(&MetadataValue::from("policy.pdf"))
    );

    assert_eq!(harness.retriever.requests()[0].query, "refund policy");
    assert_eq!(harness.model.call_count(), 2);
}

#[tokio::test]
async fn test_irrelevant_then_relevant_rewrites_once() {
    let harness = Harness::new(
        vec![
            retrieve("refund"),
            ModelReply::Text("How many days do customers have to return a purchase?".into()),
            retrieve("return window days"),
            ModelReply::Text("Within 30 days.".into()),
        ],
        vec![refund_fragment()],
        FixedGrader::sequence(vec![false, true]),
    );

    let run = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap();
    assert_eq!(
        run.path,
        vec![
            GraphNode::Agent,
            GraphNode::Retrieve,
            GraphNode::Rewrite,
            GraphNode::Agent,
            GraphNode::Retrieve,
            GraphNode::Answer,
        ]
    );
    assert_eq!(run.outcome, RunOutcome::Answered);
    assert_eq!(run.conversation.rewrite_count(), 1);

    let rewritten = run
        .conversation
        .turns()
        .iter()
        .find_map(|turn| match turn {
            Turn::RewrittenQuestion { content } => Some(content.clone()),
            _ => None,
        })
        .unwrap();
    assert_ne!(rewritten, QUESTION);

    // Second agent call sees the rewrite in its history
    let second_agent_call = &harness.model.invocations()[2];
    assert!(second_agent_call.iter().any(|m| m.content == rewritten));

    let queries: Vec<String> = harness.retriever.requests().into_iter().map(|r| r.query).collect();
    assert_eq!(queries, vec!["refund", "return window days"]);
}

#[tokio::test]
async fn test_always_irrelevant_stops_at_rewrite_budget() {
    let harness = Harness::new(
        vec![
            retrieve("q1"),
            ModelReply::Text("rewrite 1".into()),
            retrieve("q2"),
            ModelReply::Text("rewrite 2".into()),
            retrieve("q3"),
            ModelReply::Text("best effort answer".into()),
        ],
        vec![refund_fragment()],
        FixedGrader::always(false),
    );
    let graph = harness.graph(GraphConfig {
        max_rewrites: 2,
        ..GraphConfig::default()
    });

    let run = graph.run(QUESTION).await.unwrap();
    let rewrites = run.path.iter().filter(|n| **n == GraphNode::Rewrite).count();
    assert_eq!(rewrites, 2);
    assert_eq!(run.path.last(), Some(&GraphNode::Answer));
    assert_eq!(run.outcome, RunOutcome::RewriteBudgetExhausted);
    assert_eq!(harness.grader.calls().len(), 3);

    let response = run.into_response();
    assert_eq!(response.message.as_deref(), Some("best effort answer"));
    assert!(response.reasoning.unwrap().contains("2 rewrite(s)"));
    assert_eq!(response.sources.len(), 1);
}

#[tokio::test]
async fn test_original_question_stays_first() {
    let harness = Harness::new(
        vec![
            retrieve("a"),
            ModelReply::Text("rephrased".into()),
            retrieve("b"),
            ModelReply::Text("done".into()),
        ],
        vec![refund_fragment()],
        FixedGrader::sequence(vec![false, true]),
    );

    let run = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap();
    assert_eq!(run.conversation.turns()[0], Turn::question(QUESTION));
    assert_eq!(run.conversation.original_question(), QUESTION);

    // Grading always judges against the original question
    for (question, _) in harness.grader.calls() {
        assert_eq!(question, QUESTION);
    }

    // Agent calls 0 and 2 open with the original question
    let calls = harness.model.invocations();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0][0].content, QUESTION);
    assert_eq!(calls[2][0].content, QUESTION);

    // The rewrite call rephrases the original question
    assert!(calls[1].iter().any(|m| m.content.contains(QUESTION)));

    // The answer call is built from the original question, not the rewrite
    assert!(calls[3].iter().any(|m| m.content.contains(QUESTION)));
    assert!(!calls[3].iter().any(|m| m.content.contains("rephrased")));
}

#[tokio::test]
async fn test_malformed_tool_call_fails_before_retrieval() {
    let harness = Harness::new(
        vec![ModelReply::tool_call("retrieve", json!({ "q": "refund" }))],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );

    let err = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap_err();
    assert!(matches!(err, RagError::MalformedToolCall { .. }));
    assert!(harness.retriever.requests().is_empty());
    assert!(harness.grader.calls().is_empty());
}

#[tokio::test]
async fn test_mixed_tool_calls_fail_before_any_retrieval() {
    let harness = Harness::new(
        vec![ModelReply::ToolCalls {
            calls: vec![
                ToolCall::new("retrieve", json!({ "query": "refund" })),
                ToolCall::new("retrieve", json!({ "query": 42 })),
            ],
            content: String::new(),
        }],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );

    let err = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap_err();
    assert!(matches!(err, RagError::MalformedToolCall { .. }));
    assert!(err.to_string().contains("'query' must be a string"));
    assert!(harness.retriever.requests().is_empty());
}

#[tokio::test]
async fn test_blank_query_is_malformed() {
    let harness = Harness::new(
        vec![retrieve("   ")],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );

    let err = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap_err();
    assert!(err.is_contract_violation());
    assert!(harness.retriever.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_tool_is_fatal() {
    let harness = Harness::new(
        vec![ModelReply::tool_call("web_search", json!({ "query": "refund" }))],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );

    let err = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap_err();
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn test_zero_top_k_declines_without_citations() {
    let harness = Harness::new(
        vec![retrieve("refund policy")],
        vec![refund_fragment()],
        FixedGrader::always(true),
    );
    let config = GraphConfig {
        retrieval: RetrievalRequest::new("").with_top_k(0),
        ..GraphConfig::default()
    };

    let response = harness.graph(config).ask(QUESTION).await.unwrap();
    assert_eq!(response.message.as_deref(), Some(INSUFFICIENT_EVIDENCE_ANSWER));
    assert!(response.sources.is_empty());

    // Only the agent call reached the model
    assert_eq!(harness.model.call_count(), 1);
}

#[tokio::test]
async fn test_blank_context_declines_without_citations() {
    let harness = Harness::new(
        vec![retrieve("refund policy")],
        vec![ScoredFragment::new("   ", 1.0)],
        FixedGrader::always(true),
    );

    let run = harness.graph(GraphConfig::default()).run(QUESTION).await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Answered);

    let response = run.into_response();
    assert_eq!(response.message.as_deref(), Some(INSUFFICIENT_EVIDENCE_ANSWER));
    assert!(response.sources.is_empty());
    assert_eq!(harness.model.call_count(), 1);
}

#[tokio::test]
async fn test_retrieval_failure_propagates() {
    let model = Arc::new(ScriptedModel::new().with_replies(vec![retrieve("refund")]));
    let graph = RagGraph::with_defaults(GraphPorts {
        model,
        retriever: Arc::new(StaticRetriever::failing("index unavailable")),
        grader: Arc::new(FixedGrader::always(true)),
    });

    let err = graph.run(QUESTION).await.unwrap_err();
    assert!(matches!(err, RagError::RetrievalError(_)));
    assert!(err.is_dependency_failure());
}

#[tokio::test]
async fn test_concurrent_runs_share_one_graph() {
    let model = Arc::new(ScriptedModel::new().with_default_reply(ModelReply::Text("Hello!".into())));
    let graph = Arc::new(RagGraph::with_defaults(GraphPorts {
        model: model.clone(),
        retriever: Arc::new(StaticRetriever::new(vec![refund_fragment()])),
        grader: Arc::new(FixedGrader::always(true)),
    }));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let graph = graph.clone();
            tokio::spawn(async move { graph.run(&format!("hello {}", i)).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let run = handle.await.unwrap().unwrap();
        assert_eq!(run.outcome, RunOutcome::DirectAnswer);
        assert_eq!(run.conversation.original_question(), format!("hello {}", i));
        assert_eq!(run.conversation.len(), 2);
    }
    assert_eq!(model.call_count(), 8);
}
