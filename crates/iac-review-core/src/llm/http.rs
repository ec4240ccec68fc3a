use super::{FailureReason, LlmSettings, ProviderKind, SummaryClient, SummaryError, SummaryRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Posts the messages request to a JSON endpoint (gateway or proxy in front of a model).
#[derive(Debug, Clone)]
pub struct HttpSummaryClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpSummaryClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let url = settings
            .endpoint
            .clone()
            .context("http summarization provider requires an endpoint")?;
        let http = Client::builder()
            .user_agent(concat!("iac-review/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .context("failed to build summarization HTTP client")?;
        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl SummaryClient for HttpSummaryClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Http
    }

    async fn complete(&self, prompt: &str) -> Result<Value, SummaryError> {
        let payload = SummaryRequest::user_prompt(Some(self.model.clone()), prompt);
        let mut request = self.http.post(&self.url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            let reason = if err.is_timeout() {
                FailureReason::Timeout
            } else {
                FailureReason::Transport
            };
            SummaryError::new(ProviderKind::Http, reason, err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %body, "summarization endpoint returned an error");
            return Err(SummaryError::new(
                ProviderKind::Http,
                reason_for_status(status),
                format!("{status}: {}", body.trim()),
            ));
        }

        response.json::<Value>().await.map_err(|err| {
            SummaryError::new(ProviderKind::Http, FailureReason::MalformedReply, err.to_string())
        })
    }
}

fn reason_for_status(status: StatusCode) -> FailureReason {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureReason::Authentication,
        StatusCode::TOO_MANY_REQUESTS => FailureReason::Throttled,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureReason::Timeout,
        s if s.is_client_error() => FailureReason::Rejected,
        _ => FailureReason::Service,
    }
}
