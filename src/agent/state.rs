//! Graph state machine for agentic retrieval
//!
//! Deterministic finite state machine driving a graph run:
//! - Safety: only the listed edges are accepted
//! - Termination: every run ends at `End` through `Agent` or `Answer`
//! - Determinism: unique next node per (node, event)

use crate::errors::{RagError, Result};
use crate::types::DocumentGrade;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Graph nodes, including the `Start` and `End` pseudo-nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNode {
    /// Entry pseudo-node
    Start,

    /// Model decides between calling the retrieval tool and answering directly
    Agent,

    /// Retrieval tool execution followed by the grading branch
    Retrieve,

    /// Original question is reformulated
    Rewrite,

    /// Final answer is synthesized from graded evidence
    Answer,

    /// Exit pseudo-node (terminal)
    End,
}

/// Events that trigger node transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEvent {
    /// Run started
    Begin,

    /// Agent replied with a retrieval tool call
    ToolCallRequested,

    /// Agent replied with plain text
    DirectAnswer,

    /// Grader judged the retrieved content relevant
    Relevant,

    /// Grader judged the retrieved content irrelevant
    Irrelevant,

    /// Grader said irrelevant but no rewrites are left
    RewriteBudgetExhausted,

    /// Rewrite node appended a new question
    Rewritten,

    /// Answer node appended the final answer
    Answered,
}

impl GraphEvent {
    /// Branch selection for the grading step
    ///
    /// Pure function of the grade: the same verdict always selects the same edge.
    pub fn from_grade(grade: DocumentGrade) -> Self {
        if grade.is_relevant {
            GraphEvent::Relevant
        } else {
            GraphEvent::Irrelevant
        }
    }
}

impl GraphNode {
    /// Check if this is the terminal node
    pub fn is_terminal(&self) -> bool {
        matches!(self, GraphNode::End)
    }

    /// Attempt node transition with validation
    ///
    /// # Specification
    ///
    /// Transition Function: T: N × Event → Result<N>
    ///
    /// Valid transitions (8 edges):
    /// 1. Start    → Agent    (on: Begin)
    /// 2. Agent    → Retrieve (on: ToolCallRequested)
    /// 3. Agent    → End      (on: DirectAnswer)
    /// 4. Retrieve → Answer   (on: Relevant)
    /// 5. Retrieve → Rewrite  (on: Irrelevant)
    /// 6. Retrieve → Answer   (on: RewriteBudgetExhausted)
    /// 7. Rewrite  → Agent    (on: Rewritten)
    /// 8. Answer   → End      (on: Answered)
    pub fn transition(&self, event: GraphEvent) -> Result<GraphNode> {
        use GraphEvent::*;
        use GraphNode::*;

        let next = match (self, event) {
            (Start, Begin) => Agent,

            (Agent, ToolCallRequested) => Retrieve,
            (Agent, DirectAnswer) => End,

            (Retrieve, Relevant) => Answer,
            (Retrieve, Irrelevant) => Rewrite,
            (Retrieve, RewriteBudgetExhausted) => Answer,

            (Rewrite, Rewritten) => Agent,

            (Answer, Answered) => End,

            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: from.to_string(),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {} on {:?}", from, event),
                });
            }
        };

        Ok(next)
    }

    /// Get all valid events from this node
    pub fn valid_events(&self) -> Vec<GraphEvent> {
        use GraphEvent::*;
        use GraphNode::*;

        match self {
            Start => vec![Begin],
            Agent => vec![ToolCallRequested, DirectAnswer],
            Retrieve => vec![Relevant, Irrelevant, RewriteBudgetExhausted],
            Rewrite => vec![Rewritten],
            Answer => vec![Answered],
            End => vec![],
        }
    }

    /// Node name as used in traces and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphNode::Start => "start",
            GraphNode::Agent => "agent",
            GraphNode::Retrieve => "retrieve",
            GraphNode::Rewrite => "rewrite",
            GraphNode::Answer => "answer",
            GraphNode::End => "end",
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
