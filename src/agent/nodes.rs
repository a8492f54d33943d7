//! Graph node implementations
//!
//! Each node reads the conversation and returns a delta (the turns to
//! append). Routing functions turn the appended state into the event that
//! selects the next edge. Nodes never retry: port failures propagate.

use crate::agent::conversation::Conversation;
use crate::agent::state::GraphEvent;
use crate::errors::{RagError, Result};
use crate::models::{render_turns, ChatModel, ModelReply};
use crate::rag::prompts::{self, INSUFFICIENT_EVIDENCE_ANSWER};
use crate::rag::RelevanceGrader;
use crate::tools::ToolRegistry;
use crate::types::{DocumentGrade, Turn};

/// Agent node: one model call with the full history and the tools attached
pub async fn agent_node(
    model: &dyn ChatModel,
    tools: &ToolRegistry,
    conversation: &Conversation,
) -> Result<Vec<Turn>> {
    let messages = render_turns(conversation.turns());
    let reply = model.invoke(&messages, &tools.schemas()).await?;

    tracing::info!(
        node = "agent",
        tool_call = reply.is_tool_call(),
        "agent replied"
    );

    Ok(vec![reply.into_turn()])
}

/// Route after the agent: tool calls go to retrieval, text ends the run
///
/// Every requested call is validated here, so a malformed call fails the
/// run before any retrieval happens.
pub fn route_agent(conversation: &Conversation, tools: &ToolRegistry) -> Result<GraphEvent> {
    let calls = conversation.last().tool_calls();
    if calls.is_empty() {
        return Ok(GraphEvent::DirectAnswer);
    }

    for call in calls {
        tools.validate(call)?;
    }
    Ok(GraphEvent::ToolCallRequested)
}

/// Retrieve node: execute each pending tool call in order
///
/// # Complexity
/// One retrieval per requested call; one tool-result turn per call
pub async fn retrieve_node(tools: &ToolRegistry, conversation: &Conversation) -> Result<Vec<Turn>> {
    let calls = conversation.last().tool_calls();
    if calls.is_empty() {
        return Err(RagError::Generic(format!(
            "retrieve node needs a pending tool call, last turn is {}",
            conversation.last().kind()
        )));
    }

    let mut delta = Vec::with_capacity(calls.len());
    for call in calls {
        delta.push(tools.dispatch(call).await?);
    }

    tracing::info!(node = "retrieve", calls = delta.len(), "tool calls executed");
    Ok(delta)
}

/// Grading branch: original question against the latest tool result
pub async fn grade(grader: &dyn RelevanceGrader, conversation: &Conversation) -> Result<DocumentGrade> {
    let question = conversation.original_question();
    let context = conversation.last().content();

    let verdict = grader.grade(question, context).await?;
    tracing::info!(node = "grade", is_relevant = verdict.is_relevant, "documents graded");
    Ok(verdict)
}

/// Rewrite node: reformulate the original question
pub async fn rewrite_node(model: &dyn ChatModel, conversation: &Conversation) -> Result<Vec<Turn>> {
    let messages = prompts::rewrite_messages(conversation.original_question());
    let content = expect_text(model.invoke(&messages, &[]).await?, "rewrite")?;

    tracing::info!(node = "rewrite", rewritten = %content, "question rewritten");
    Ok(vec![Turn::RewrittenQuestion { content }])
}

/// Answer node: synthesize from the original question and the latest turn
///
/// Empty evidence yields a fixed decline without a model call.
pub async fn answer_node(model: &dyn ChatModel, conversation: &Conversation) -> Result<Vec<Turn>> {
    let context = conversation.last().content();

    if context.trim().is_empty() {
        tracing::info!(node = "answer", "no evidence, declining");
        return Ok(vec![Turn::model_text(INSUFFICIENT_EVIDENCE_ANSWER)]);
    }

    let messages = prompts::answer_messages(conversation.original_question(), context);
    let content = expect_text(model.invoke(&messages, &[]).await?, "answer")?;

    tracing::info!(node = "answer", chars = content.len(), "answer synthesized");
    Ok(vec![Turn::model_text(content)])
}

/// Nodes that offer no tools must get text back
fn expect_text(reply: ModelReply, node: &str) -> Result<String> {
    match reply {
        ModelReply::Text(text) => Ok(text),
        ModelReply::ToolCalls { calls, .. } => Err(RagError::ContractViolation(format!(
            "{} node offered no tools but model requested {} tool call(s)",
            node,
            calls.len()
        ))),
    }
}
