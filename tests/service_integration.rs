//! Integration tests for the simple query path and the in-memory backend

use agentic_rag::{
    agent::{GraphPorts, RagGraph, RunOutcome},
    config::{Config, RetrievalBackend},
    models::ModelReply,
    rag::{
        retrieval::{CorpusEntry, InMemoryRetriever},
        QueryMode, RetrievalRequest, Retriever, ScoredFragment, SimpleQueryService,
        INSUFFICIENT_EVIDENCE_ANSWER,
    },
    testing::{FixedGrader, ScriptedModel, StaticRetriever},
};
use chrono::NaiveDate;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

fn corpus() -> Vec<CorpusEntry> {
    vec![
        CorpusEntry::new("Refunds are accepted within 30 days of purchase."),
        CorpusEntry::new("Shipping takes five business days."),
        CorpusEntry::new("Support is available by email around the clock."),
    ]
}

#[tokio::test]
async fn test_query_is_idempotent_with_fixed_date() {
    let model = Arc::new(
        ScriptedModel::new().with_default_reply(ModelReply::Text("Within 30 days.".into())),
    );
    let retriever = Arc::new(StaticRetriever::new(vec![
        ScoredFragment::new("Refunds are accepted within 30 days.", 0.9),
        ScoredFragment::new("Shipping takes five business days.", 0.2),
    ]));
    let service = SimpleQueryService::new(model.clone(), retriever)
        .with_fixed_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

    let first = service.query("refund window?").await.unwrap();
    let second = service.query("refund window?").await.unwrap();
    assert_eq!(first, second);

    let calls = model.invocations();
    assert_eq!(calls[0], calls[1]);
}

#[tokio::test]
async fn test_query_without_evidence_skips_model() {
    let model = Arc::new(ScriptedModel::new());
    let service = SimpleQueryService::new(model.clone(), Arc::new(StaticRetriever::new(vec![])));

    let response = service.query("anything").await.unwrap();
    assert_eq!(response.message.as_deref(), Some(INSUFFICIENT_EVIDENCE_ANSWER));
    assert!(response.sources.is_empty());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_documents_uses_its_own_top_k() {
    let fragments = (0..20)
        .map(|i| ScoredFragment::new(format!("fragment {}", i), 1.0 / (i as f32 + 1.0)))
        .collect();
    let retriever = Arc::new(StaticRetriever::new(fragments));
    let model = Arc::new(ScriptedModel::new());
    let service = SimpleQueryService::new(model.clone(), retriever.clone());

    assert_eq!(service.documents("q", None).await.unwrap().len(), 10);
    assert_eq!(service.documents("q", Some(3)).await.unwrap().len(), 3);
    assert_eq!(model.call_count(), 0);

    let requested: Vec<usize> = retriever.requests().iter().map(|r| r.top_k).collect();
    assert_eq!(requested, vec![10, 3]);
}

#[tokio::test]
async fn test_sparse_memory_retrieval_ranks_keyword_match_first() {
    let retriever = InMemoryRetriever::new(corpus()).unwrap();

    let results = retriever
        .retrieve(
            &RetrievalRequest::new("shipping days")
                .with_mode(QueryMode::Sparse)
                .with_top_k(2),
        )
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert!(results.len() <= 2);
    assert!(results[0].text.starts_with("Shipping"));
}

#[tokio::test]
async fn test_graph_over_jsonl_corpus() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for entry in corpus() {
        writeln!(file, "{}", serde_json::to_string(&entry).unwrap()).unwrap();
    }

    let mut config = Config::default();
    config.retrieval.backend = RetrievalBackend::Memory;
    config.retrieval.corpus_path = Some(file.path().to_path_buf());
    config.validate().unwrap();

    let retriever = Arc::new(InMemoryRetriever::from_jsonl(file.path()).unwrap());
    assert_eq!(retriever.len(), 3);

    let model = Arc::new(ScriptedModel::new().with_replies(vec![
        ModelReply::tool_call("retrieve", json!({ "query": "refunds purchase" })),
        ModelReply::Text("Refunds are accepted within 30 days.".into()),
    ]));
    let graph = RagGraph::new(
        GraphPorts {
            model,
            retriever,
            grader: Arc::new(FixedGrader::always(true)),
        },
        config.graph_config(),
    );

    let run = graph.run("How long do I have to get a refund?").await.unwrap();
    assert_eq!(run.outcome, RunOutcome::Answered);

    let response = run.into_response();
    assert!(response.sources[0].text.starts_with("Refunds"));
}
