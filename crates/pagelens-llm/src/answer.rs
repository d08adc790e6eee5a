//! Grounded answer synthesis over retrieved hits

use crate::message::ChatMessage;
use crate::{ChatModel, LlmError};
use pagelens_domain::QueryHit;
use std::fmt::Write as _;
use tracing::debug;

const SYSTEM_PROMPT: &str = "Answer the user's question *only* using the provided context. \
If unsure, say you don't know.";

/// Render hits as the numbered context block given to the model
///
/// Each hit becomes `[i] page=.. bbox=.. source=..` followed by its content.
/// Missing page or bbox are shown as `?`.
pub fn build_context(hits: &[QueryHit]) -> String {
    let mut context = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let page = hit
            .page()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let bbox = hit
            .bbox()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = write!(
            context,
            "[{}] page={} bbox={} source={}\n{}\n\n",
            i + 1,
            page,
            bbox,
            hit.source(),
            hit.content
        );
    }
    context
}

/// Ask `model` to answer `question` from `hits` only
pub async fn synthesize_answer(
    model: &dyn ChatModel,
    question: &str,
    hits: &[QueryHit],
) -> Result<String, LlmError> {
    let context = build_context(hits);
    debug!(model = model.model_name(), hits = hits.len(), "synthesizing answer");

    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Question:\n{}\n\nContext:\n{}\n\nAnswer clearly and concisely.",
            question, context
        )),
    ];

    let answer = model.complete(&messages).await?;
    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use pagelens_domain::{BoundingBox, NormalizedEntry, Record};

    fn hit(page: u32, text: &str) -> QueryHit {
        let record = Record::text(page, BoundingBox::new(1.0, 2.0, 3.0, 4.0), text, "/in/a.pdf");
        let entry = NormalizedEntry::from_record(&record).unwrap();
        QueryHit {
            id: "0".into(),
            content: entry.content,
            metadata: entry.metadata,
            distance: 0.2,
        }
    }

    #[test]
    fn test_context_format() {
        let context = build_context(&[hit(2, "Invoice #42"), hit(5, "Due in 30 days")]);
        assert_eq!(
            context,
            "[1] page=2 bbox=[1.0, 2.0, 3.0, 4.0] source=/in/a.pdf\nInvoice #42\n\n\
             [2] page=5 bbox=[1.0, 2.0, 3.0, 4.0] source=/in/a.pdf\nDue in 30 days\n\n"
        );
    }

    #[test]
    fn test_context_missing_fields() {
        let bare = QueryHit {
            id: "3".into(),
            content: "orphan".into(),
            metadata: Default::default(),
            distance: 0.0,
        };
        assert_eq!(build_context(&[bare]), "[1] page=? bbox=? source=\norphan\n\n");
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(build_context(&[]), "");
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_and_grounded() {
        let provider = MockProvider::new("  The invoice number is 42.\n");
        let answer = synthesize_answer(&provider, "What is the invoice number?", &[hit(1, "Invoice #42")])
            .await
            .unwrap();
        assert_eq!(answer, "The invoice number is 42.");

        let request = &provider.requests()[0];
        assert!(request[0].text().contains("only"));
        let user = request[1].text();
        assert!(user.starts_with("Question:\nWhat is the invoice number?\n\nContext:\n[1] page=1"));
        assert!(user.ends_with("Answer clearly and concisely."));
    }

    #[tokio::test]
    async fn test_answer_error_propagates() {
        let provider = MockProvider::failing();
        let result = synthesize_answer(&provider, "q", &[]).await;
        assert!(result.is_err());
    }
}
