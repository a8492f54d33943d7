//! Append-only conversation log for a graph run
//!
//! Holds every turn of a run in order:
//! - The first turn is the original question and never changes
//! - Turns are only ever appended, never edited or evicted
//! - Node outputs are applied as deltas (a batch of new turns)

use crate::types::{Source, Turn};

/// Conversation history threaded through graph nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation from the user's question
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::question(question)],
        }
    }

    /// Append a node's output
    ///
    /// # Complexity
    /// O(k) for k new turns, amortized
    pub fn append(&mut self, delta: Vec<Turn>) {
        self.turns.extend(delta);
    }

    /// Append a single turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The question that started the run
    pub fn original_question(&self) -> &str {
        // Invariant: constructors guarantee turns[0] is a UserQuestion
        self.turns[0].content()
    }

    /// Most recent turn
    pub fn last(&self) -> &Turn {
        // Invariant: never empty
        &self.turns[self.turns.len() - 1]
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Sources attached to the most recent tool result
    pub fn latest_sources(&self) -> &[Source] {
        self.turns
            .iter()
            .rev()
            .find_map(|turn| match turn {
                Turn::ToolResult { sources, .. } => Some(sources.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Number of rewritten questions in the log
    pub fn rewrite_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::RewrittenQuestion { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_result(content: &str, sources: Vec<Source>) -> Turn {
        Turn::ToolResult {
            call_id: "call_1".to_string(),
            tool: "retrieve".to_string(),
            content: content.to_string(),
            sources,
        }
    }

    #[test]
    fn test_new_conversation() {
        let conv = Conversation::new("What is the refund policy?");
        assert_eq!(conv.len(), 1);
        assert!(!conv.is_empty());
        assert_eq!(conv.original_question(), "What is the refund policy?");
        assert_eq!(conv.last(), &Turn::question("What is the refund policy?"));
    }

    #[test]
    fn test_append_keeps_first_turn() {
        let mut conv = Conversation::new("q");
        conv.append(vec![
            Turn::model_text("a"),
            Turn::RewrittenQuestion {
                content: "q, rephrased".to_string(),
            },
        ]);
        conv.push(Turn::model_text("b"));

        assert_eq!(conv.len(), 4);
        assert_eq!(conv.original_question(), "q");
        assert_eq!(conv.rewrite_count(), 1);
        assert_eq!(conv.last().content(), "b");
    }

    #[test]
    fn test_latest_sources() {
        let mut conv = Conversation::new("q");
        assert!(conv.latest_sources().is_empty());

        conv.push(tool_result("first", vec![Source::new("first")]));
        conv.push(tool_result("second", vec![Source::new("second"), Source::new("third")]));

        let sources = conv.latest_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].text, "second");
    }

    #[quickcheck_macros::quickcheck]
    fn prop_first_turn_survives_appends(question: String, appended: Vec<String>) -> bool {
        let mut conv = Conversation::new(question.clone());
        for text in &appended {
            conv.append(vec![Turn::model_text(text.clone())]);
        }
        conv.original_question() == question && conv.len() == appended.len() + 1
    }
}
