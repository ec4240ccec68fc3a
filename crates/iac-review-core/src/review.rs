use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::condense::CondensedFindings;
use crate::llm::{FailureReason, SummaryClient, SummaryError};

/// Summary text used when the summarization service cannot be reached.
pub const REVIEW_FAILED_TEXT: &str = "AI review generation failed.";

const REVIEW_INSTRUCTIONS: &str = "You are a Senior Cloud Security Architect. Review the following Terrascan findings \
and provide a concise, executive summary. Group issues by severity (High, Medium, Low). \
Highlight the single most critical fix needed. Format the output in clean Markdown.";

/// Build the reviewer prompt with the condensed findings embedded as JSON.
pub fn build_prompt(condensed: &CondensedFindings) -> serde_json::Result<String> {
    Ok(format!(
        "{REVIEW_INSTRUCTIONS}\n\nFINDINGS:\n{}",
        condensed.to_pretty_json()?
    ))
}

/// Known reply layouts, checked in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// `{"content": [{"text": ...}, ...]}`
    ContentBlocks(String),
    /// `{"output": [{"text": ...}, ...]}`
    OutputItems(String),
    Unrecognized(Value),
}

impl ModelReply {
    pub fn from_value(value: Value) -> Self {
        if let Some(text) = first_text(&value, "content") {
            return Self::ContentBlocks(text);
        }
        if let Some(text) = first_text(&value, "output") {
            return Self::OutputItems(text);
        }
        Self::Unrecognized(value)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Extracted text, or the whole reply pretty-printed when no shape matched.
    pub fn into_text(self) -> String {
        match self {
            Self::ContentBlocks(text) | Self::OutputItems(text) => text,
            Self::Unrecognized(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

fn first_text(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)?
        .as_array()?
        .first()?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// Why a review is degraded. Never fatal to the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    ServiceFailure(SummaryError),
    UnrecognizedShape,
}

/// Normalized summary text plus the degradation, if any, that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub text: String,
    pub degradation: Option<Degradation>,
}

impl ReviewOutcome {
    pub fn is_degraded(&self) -> bool {
        self.degradation.is_some()
    }
}

/// Ask the summarization service for a review of the condensed findings.
///
/// Service failures fall back to [`REVIEW_FAILED_TEXT`]; unrecognized replies
/// are kept verbatim as serialized JSON.
#[instrument(name = "request_review", skip_all, fields(provider = %client.provider()))]
pub async fn request_review(client: &dyn SummaryClient, condensed: &CondensedFindings) -> ReviewOutcome {
    let prompt = match build_prompt(condensed) {
        Ok(prompt) => prompt,
        Err(err) => {
            let err = SummaryError::new(
                client.provider(),
                FailureReason::Rejected,
                format!("failed to encode findings: {err}"),
            );
            return fallback(err);
        }
    };
    debug!(prompt_len = prompt.len(), "sending review prompt");

    let value = match client.complete(&prompt).await {
        Ok(value) => value,
        Err(err) => return fallback(err),
    };
    debug!(reply = %value, "summarization reply received");

    let reply = ModelReply::from_value(value);
    let degradation = if reply.is_recognized() {
        None
    } else {
        warn!("summarization reply matched no known shape; storing raw reply");
        Some(Degradation::UnrecognizedShape)
    };
    ReviewOutcome {
        text: reply.into_text(),
        degradation,
    }
}

fn fallback(err: SummaryError) -> ReviewOutcome {
    warn!(reason = %err.reason, error = %err, "AI review generation failed");
    ReviewOutcome {
        text: REVIEW_FAILED_TEXT.to_string(),
        degradation: Some(Degradation::ServiceFailure(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condense::condense;
    use crate::llm::ProviderKind;
    use crate::scanner::ScanDocument;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<Value, SummaryError>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(reply: Result<Value, SummaryError>) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SummaryClient for ScriptedClient {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Noop
        }

        async fn complete(&self, prompt: &str) -> Result<Value, SummaryError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn condensed() -> CondensedFindings {
        let doc = ScanDocument::from_json(
            r#"{"results":{"scan_summary":{"violated_policies":0}},"violations":[]}"#,
        )
        .unwrap();
        condense(&doc)
    }

    #[test]
    fn content_blocks_take_priority() {
        let reply = ModelReply::from_value(json!({
            "content": [{"text": "X"}, {"text": "ignored"}],
            "output": [{"text": "Y"}]
        }));
        assert_eq!(reply, ModelReply::ContentBlocks("X".into()));
        assert_eq!(reply.into_text(), "X");
    }

    #[test]
    fn output_items_are_second_choice() {
        let reply = ModelReply::from_value(json!({"output": [{"text": "Y"}]}));
        assert_eq!(reply.into_text(), "Y");

        let reply = ModelReply::from_value(json!({"content": [], "output": [{"text": "Y"}]}));
        assert_eq!(reply, ModelReply::OutputItems("Y".into()));
    }

    #[test]
    fn unrecognized_reply_is_serialized_whole() {
        let raw = json!({"output": {"message": {"content": [{"text": "nested"}]}}});
        let reply = ModelReply::from_value(raw.clone());
        assert!(!reply.is_recognized());
        let text = reply.into_text();
        assert!(!text.is_empty());
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), raw);
    }

    #[test]
    fn prompt_embeds_condensed_findings() {
        let prompt = build_prompt(&condensed()).unwrap();
        assert!(prompt.starts_with("You are a Senior Cloud Security Architect."));
        assert!(prompt.contains("Group issues by severity (High, Medium, Low)."));
        assert!(prompt.contains("single most critical fix"));
        assert!(prompt.contains("FINDINGS:\n{\n  \"scan_summary\""));
        assert!(prompt.contains("\"violations\": \"No violations found\""));
    }

    #[tokio::test]
    async fn request_review_extracts_text() {
        let client = ScriptedClient::new(Ok(json!({"content": [{"text": "All clear"}]})));
        let outcome = request_review(&client, &condensed()).await;
        assert_eq!(outcome.text, "All clear");
        assert!(!outcome.is_degraded());
        assert_eq!(client.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn service_failure_uses_fallback_text() {
        let failure = SummaryError::new(ProviderKind::Bedrock, FailureReason::Authentication, "denied");
        let client = ScriptedClient::new(Err(failure.clone()));
        let outcome = request_review(&client, &condensed()).await;
        assert_eq!(outcome.text, REVIEW_FAILED_TEXT);
        assert_eq!(outcome.degradation, Some(Degradation::ServiceFailure(failure)));
    }

    #[tokio::test]
    async fn unrecognized_reply_is_degraded_but_kept() {
        let client = ScriptedClient::new(Ok(json!({"completion": "text"})));
        let outcome = request_review(&client, &condensed()).await;
        assert_eq!(outcome.degradation, Some(Degradation::UnrecognizedShape));
        assert!(outcome.text.contains("\"completion\": \"text\""));
    }
}
