//! Prompt templates
//!
//! Each builder returns the full message list for one model call.

use crate::models::ChatMessage;
use chrono::NaiveDate;

/// Answer given when retrieval produced no usable evidence
pub const INSUFFICIENT_EVIDENCE_ANSWER: &str =
    "There is no information on this topic for me to answer.";

const QUERY_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about a set of documents.
The user asks a question and you answer it using only the documents provided with it.

Rules:
- Rely exclusively on the provided documents.
- If the documents are not relevant to the question, reply with \"{insufficient}\"
- Keep the answer short and to the point.
- Check your answer against the documents before replying.

Today is {date}.";

const QUERY_USER_PROMPT: &str = "User question:
<question>
{query}
</question>

Documents:
<documents>
{documents}
</documents>
";

const GRADE_PROMPT: &str = "You are grading whether a retrieved document is relevant to a user question.

Retrieved document:
<document>
{context}
</document>

User question:
<question>
{question}
</question>

Grade the document as relevant if it shares keywords or meaning with the question.
Answer with a JSON object of the form {\"is_relevant\": true} or {\"is_relevant\": false}.";

const REWRITE_PROMPT: &str = "Consider the question below and reason about the intent behind it.

<question>
{question}
</question>

Write one improved version of the question that is more likely to match relevant documents.
Reply with the improved question only.";

const ANSWER_PROMPT: &str = "You answer questions using retrieved context.
Use only the context below. If it does not contain the answer, say that you don't know.
Answer in at most three sentences.

Question:
<question>
{question}
</question>

Context:
<context>
{context}
</context>";

/// Substitute `{key}` placeholders in a single pass
///
/// Substituted values are never rescanned, so user text containing braces
/// is inserted verbatim. Unknown placeholders are left untouched.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replacement = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });

        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// System and user prompts for the simple query service
pub fn query_messages(query: &str, documents: &str, date: NaiveDate) -> Vec<ChatMessage> {
    let date = date.format("%Y-%m-%d").to_string();
    let system = fill(
        QUERY_SYSTEM_PROMPT,
        &[("insufficient", INSUFFICIENT_EVIDENCE_ANSWER), ("date", date.as_str())],
    );
    let user = fill(QUERY_USER_PROMPT, &[("query", query), ("documents", documents)]);

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Relevance grading prompt
pub fn grade_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    let prompt = fill(GRADE_PROMPT, &[("context", context), ("question", question)]);
    vec![ChatMessage::user(prompt)]
}

/// Question reformulation prompt
pub fn rewrite_messages(question: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(fill(REWRITE_PROMPT, &[("question", question)]))]
}

/// Answer synthesis prompt
pub fn answer_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    let prompt = fill(ANSWER_PROMPT, &[("question", question), ("context", context)]);
    vec![ChatMessage::user(prompt)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_query_messages() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let messages = query_messages("What is the refund policy?", "Refunds within 30 days.", date);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Today is 2024-03-09."));
        assert!(messages[0].content.contains(INSUFFICIENT_EVIDENCE_ANSWER));
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.contains("<question>\nWhat is the refund policy?\n</question>"));
        assert!(messages[1].content.contains("Refunds within 30 days."));
    }

    #[test]
    fn test_grade_messages_carry_both_inputs() {
        let messages = grade_messages("refund policy?", "Refunds within 30 days.");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("<document>\nRefunds within 30 days.\n</document>"));
        assert!(messages[0].content.contains("<question>\nrefund policy?\n</question>"));
    }

    #[test]
    fn test_rewrite_uses_only_question() {
        let messages = rewrite_messages("refund policy?");
        assert!(messages[0].content.contains("refund policy?"));
        assert!(!messages[0].content.contains("{question}"));
    }

    #[test]
    fn test_fill_is_single_pass() {
        assert_eq!(fill("a {x} b", &[("x", "{y}"), ("y", "no")]), "a {y} b");
        assert_eq!(fill("{\"k\": 1}", &[("k", "v")]), "{\"k\": 1}");
        assert_eq!(fill("open { only", &[]), "open { only");
    }

    #[test]
    fn test_grade_prompt_keeps_json_example() {
        let messages = grade_messages("q", "c");
        assert!(messages[0].content.contains("{\"is_relevant\": true}"));
    }

    #[test]
    fn test_answer_messages() {
        let messages = answer_messages("q", "ctx");
        assert!(messages[0].content.contains("<context>\nctx\n</context>"));
        assert!(messages[0].content.contains("don't know"));
    }
}
