//! Context assembly for retrieval-augmented prompts
//!
//! Turns a ranked fragment list into the single text block a model sees,
//! keeping the fragments alongside as citable sources.

use serde::{Deserialize, Serialize};

use crate::rag::retrieval::ScoredFragment;
use crate::types::Source;

/// Separator between fragments in an assembled context
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// Assembled context for prompt augmentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    /// Fragment texts joined by a blank line, in rank order
    pub text: String,

    /// The fragments themselves, in the same order
    pub sources: Vec<Source>,
}

impl AssembledContext {
    /// Build context from ranked fragments
    pub fn from_fragments(fragments: Vec<ScoredFragment>) -> Self {
        let text = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR);

        Self {
            text,
            sources: fragments.into_iter().map(Source::from).collect(),
        }
    }

    /// True when no fragment was retrieved
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_joined_by_blank_line() {
        let context = AssembledContext::from_fragments(vec![
            ScoredFragment::new("Refunds are accepted within 30 days.", 0.9),
            ScoredFragment::new("Store credit is issued after 30 days.", 0.4),
        ]);

        assert_eq!(
            context.text,
            "Refunds are accepted within 30 days.\n\nStore credit is issued after 30 days."
        );
        assert_eq!(context.document_count(), 2);
        assert_eq!(context.sources[1].text, "Store credit is issued after 30 days.");
    }

    #[test]
    fn test_empty_context() {
        let context = AssembledContext::from_fragments(Vec::new());
        assert!(context.is_empty());
        assert_eq!(context.text, "");
    }
}
