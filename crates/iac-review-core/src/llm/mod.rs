mod bedrock;
mod http;
mod settings;

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

pub use bedrock::BedrockClient;
pub use http::HttpSummaryClient;
pub use settings::{LlmProfile, LlmSettings};
pub(crate) use settings::{non_blank, parse_timeout};

/// Backends able to produce a review summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Bedrock,
    Http,
    Noop,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "http" => Ok(Self::Http),
            "noop" => Ok(Self::Noop),
            other => bail!("unknown summarization provider `{other}` (expected bedrock, http, or noop)"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bedrock => "bedrock",
            Self::Http => "http",
            Self::Noop => "noop",
        };
        f.write_str(label)
    }
}

/// Why a summarization call failed. Used to label degraded reviews in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Authentication,
    Throttled,
    Rejected,
    Service,
    Timeout,
    Transport,
    MalformedReply,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Authentication => "authentication failed",
            Self::Throttled => "throttled",
            Self::Rejected => "request rejected",
            Self::Service => "service error",
            Self::Timeout => "timed out",
            Self::Transport => "transport error",
            Self::MalformedReply => "malformed reply",
        };
        f.write_str(label)
    }
}

/// Failure reported by a summarization backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider} {reason}: {detail}")]
pub struct SummaryError {
    pub provider: ProviderKind,
    pub reason: FailureReason,
    pub detail: String,
}

impl SummaryError {
    pub fn new(provider: ProviderKind, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            provider,
            reason,
            detail: detail.into(),
        }
    }
}

/// Request body understood by the messages-style model APIs.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<RequestMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMessage {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    pub text: String,
}

impl SummaryRequest {
    /// Single user turn carrying the whole prompt.
    pub fn user_prompt(model: Option<String>, prompt: &str) -> Self {
        Self {
            model,
            messages: vec![RequestMessage {
                role: "user",
                content: vec![ContentBlock {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// Client abstraction for the remote summarization service.
#[async_trait]
pub trait SummaryClient: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Send the prompt and return the decoded JSON reply, whatever its shape.
    async fn complete(&self, prompt: &str) -> Result<Value, SummaryError>;
}

pub const NOOP_REVIEW_TEXT: &str =
    "AI review unavailable: no summarization provider is configured for this run.";

/// Offline client used for dry runs; replies in the `output` shape.
#[derive(Debug, Default, Clone)]
pub struct NoopSummaryClient;

#[async_trait]
impl SummaryClient for NoopSummaryClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Noop
    }

    async fn complete(&self, _prompt: &str) -> Result<Value, SummaryError> {
        Ok(json!({ "output": [{ "text": NOOP_REVIEW_TEXT }] }))
    }
}

/// Build the client selected by `settings`.
pub async fn connect(settings: &LlmSettings) -> Result<Box<dyn SummaryClient>> {
    match settings.provider {
        ProviderKind::Bedrock => Ok(Box::new(BedrockClient::connect(settings).await)),
        ProviderKind::Http => Ok(Box::new(HttpSummaryClient::new(settings)?)),
        ProviderKind::Noop => Ok(Box::new(NoopSummaryClient)),
    }
}
