//! Agentic RAG graph - main coordinator
//!
//! Drives one graph run per question:
//! - State machine transitions (`GraphNode::transition`)
//! - Node execution with conversation deltas
//! - Grading branch with a bounded rewrite budget
//! - Response assembly from the final conversation
//!
//! A `RagGraph` holds only shared, immutable handles, so one instance can
//! serve concurrent runs; each run owns its own `Conversation`.

use crate::agent::conversation::Conversation;
use crate::agent::nodes;
use crate::agent::state::{GraphEvent, GraphNode};
use crate::errors::{RagError, Result};
use crate::models::ChatModel;
use crate::rag::retrieval::{RetrievalRequest, Retriever};
use crate::rag::{RelevanceGrader, INSUFFICIENT_EVIDENCE_ANSWER};
use crate::tools::{RetrieveTool, ToolRegistry};
use crate::types::{QueryResponse, Turn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

/// Default number of rewrites before answering from the last retrieval
pub const DEFAULT_MAX_REWRITES: usize = 3;

/// Port handles injected into the graph
#[derive(Clone)]
pub struct GraphPorts {
    pub model: Arc<dyn ChatModel>,
    pub retriever: Arc<dyn Retriever>,
    pub grader: Arc<dyn RelevanceGrader>,
}

/// Graph configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Rewrites allowed before a negative grade falls through to `answer`
    pub max_rewrites: usize,

    /// Mode, `top_k` and alpha used by the retrieval tool
    pub retrieval: RetrievalRequest,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_rewrites: DEFAULT_MAX_REWRITES,
            retrieval: RetrievalRequest::new(""),
        }
    }
}

/// How a run reached `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Agent answered without calling a tool
    DirectAnswer,

    /// Answer node ran after a positive grade
    Answered,

    /// Answer node ran after the rewrite budget ran out
    RewriteBudgetExhausted,
}

/// Result of one graph run
#[derive(Debug, Clone)]
pub struct GraphRun {
    /// Full conversation, original question first
    pub conversation: Conversation,

    /// Nodes executed, in order (pseudo-nodes excluded)
    pub path: Vec<GraphNode>,

    pub outcome: RunOutcome,
}

impl GraphRun {
    /// Final answer text
    pub fn answer(&self) -> &str {
        self.conversation.last().content()
    }

    /// Build the boundary response
    ///
    /// Sources are the fragments of the latest retrieval; a direct answer
    /// or a declined answer cites nothing.
    pub fn into_response(self) -> QueryResponse {
        let message = self.answer().to_string();

        if message == INSUFFICIENT_EVIDENCE_ANSWER {
            return QueryResponse::answer(message, Vec::new());
        }

        match self.outcome {
            RunOutcome::DirectAnswer => QueryResponse::answer(message, Vec::new()),
            RunOutcome::Answered => {
                QueryResponse::answer(message, self.conversation.latest_sources().to_vec())
            }
            RunOutcome::RewriteBudgetExhausted => {
                let rewrites = self.conversation.rewrite_count();
                QueryResponse::answer(message, self.conversation.latest_sources().to_vec())
                    .with_reasoning(format!(
                        "Retrieved documents were graded irrelevant after {} rewrite(s); \
                         the answer is based on the last retrieval.",
                        rewrites
                    ))
            }
        }
    }
}

/// The agentic retrieval graph
pub struct RagGraph {
    ports: GraphPorts,
    tools: ToolRegistry,
    config: GraphConfig,
}

impl RagGraph {
    /// Create graph with the retrieval tool bound to `ports.retriever`
    pub fn new(ports: GraphPorts, config: GraphConfig) -> Self {
        let tool = RetrieveTool::with_defaults(ports.retriever.clone(), config.retrieval.clone());
        let tools = ToolRegistry::new().with_tool(Arc::new(tool));

        Self {
            ports,
            tools,
            config,
        }
    }

    /// Create graph with default configuration
    pub fn with_defaults(ports: GraphPorts) -> Self {
        Self::new(ports, GraphConfig::default())
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Run the graph for `question`
    pub async fn run(&self, question: &str) -> Result<GraphRun> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("graph_run", %run_id);
        self.execute(question).instrument(span).await
    }

    /// Run the graph and return the boundary response
    pub async fn ask(&self, question: &str) -> Result<QueryResponse> {
        Ok(self.run(question).await?.into_response())
    }

    async fn execute(&self, question: &str) -> Result<GraphRun> {
        let mut conversation = Conversation::new(question);
        let mut path = Vec::new();
        let mut outcome = RunOutcome::DirectAnswer;

        let mut node = GraphNode::Start;
        let mut event = GraphEvent::Begin;

        loop {
            let next = node.transition(event)?;
            tracing::debug!(from = %node, to = %next, event = ?event, "transition");
            node = next;

            if node.is_terminal() {
                break;
            }
            path.push(node);

            event = self.step(node, &mut conversation).await?;
            match event {
                GraphEvent::Relevant => outcome = RunOutcome::Answered,
                GraphEvent::RewriteBudgetExhausted => outcome = RunOutcome::RewriteBudgetExhausted,
                GraphEvent::DirectAnswer => outcome = RunOutcome::DirectAnswer,
                _ => {}
            }
        }

        tracing::info!(
            outcome = ?outcome,
            steps = path.len(),
            rewrites = conversation.rewrite_count(),
            "graph run finished"
        );

        Ok(GraphRun {
            conversation,
            path,
            outcome,
        })
    }

    /// Execute `node`, append its delta, and return the routing event
    async fn step(&self, node: GraphNode, conversation: &mut Conversation) -> Result<GraphEvent> {
        debug_assert!(matches!(conversation.turns()[0], Turn::UserQuestion { .. }));

        match node {
            GraphNode::Agent => {
                let delta = nodes::agent_node(self.ports.model.as_ref(), &self.tools, conversation).await?;
                conversation.append(delta);
                nodes::route_agent(conversation, &self.tools)
            }
            GraphNode::Retrieve => {
                let delta = nodes::retrieve_node(&self.tools, conversation).await?;
                conversation.append(delta);

                let verdict = nodes::grade(self.ports.grader.as_ref(), conversation).await?;
                let event = GraphEvent::from_grade(verdict);

                if event == GraphEvent::Irrelevant
                    && conversation.rewrite_count() >= self.config.max_rewrites
                {
                    tracing::warn!(
                        max_rewrites = self.config.max_rewrites,
                        "rewrite budget exhausted, answering from last retrieval"
                    );
                    return Ok(GraphEvent::RewriteBudgetExhausted);
                }
                Ok(event)
            }
            GraphNode::Rewrite => {
                let delta = nodes::rewrite_node(self.ports.model.as_ref(), conversation).await?;
                conversation.append(delta);
                Ok(GraphEvent::Rewritten)
            }
            GraphNode::Answer => {
                let delta = nodes::answer_node(self.ports.model.as_ref(), conversation).await?;
                conversation.append(delta);
                Ok(GraphEvent::Answered)
            }
            GraphNode::Start | GraphNode::End => Err(RagError::InvalidTransition {
                from: node.to_string(),
                to: node.to_string(),
                reason: "pseudo-nodes have no body".to_string(),
            }),
        }
    }
}
