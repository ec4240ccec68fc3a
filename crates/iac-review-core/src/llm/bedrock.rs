use super::{FailureReason, LlmSettings, ProviderKind, SummaryClient, SummaryError, SummaryRequest};
use crate::aws::load_sdk_config;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use serde_json::Value;
use tracing::debug;

/// Invokes a Bedrock model (Amazon Nova by default) through the runtime API.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: Client,
    model_id: String,
}

impl BedrockClient {
    pub async fn connect(settings: &LlmSettings) -> Self {
        let sdk_config = load_sdk_config(settings.region.as_deref(), settings.timeout).await;
        Self::new(Client::new(&sdk_config), settings.model.clone())
    }

    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl SummaryClient for BedrockClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Bedrock
    }

    async fn complete(&self, prompt: &str) -> Result<Value, SummaryError> {
        let body = serde_json::to_vec(&SummaryRequest::user_prompt(None, prompt)).map_err(|err| {
            SummaryError::new(ProviderKind::Bedrock, FailureReason::Rejected, err.to_string())
        })?;

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|err| {
                SummaryError::new(
                    ProviderKind::Bedrock,
                    classify(&err),
                    DisplayErrorContext(&err).to_string(),
                )
            })?;

        debug!(model = %self.model_id, bytes = output.body().as_ref().len(), "bedrock replied");
        serde_json::from_slice(output.body().as_ref()).map_err(|err| {
            SummaryError::new(
                ProviderKind::Bedrock,
                FailureReason::MalformedReply,
                err.to_string(),
            )
        })
    }
}

fn classify<R>(err: &SdkError<InvokeModelError, R>) -> FailureReason {
    match err {
        SdkError::TimeoutError(_) => FailureReason::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => FailureReason::Timeout,
        SdkError::DispatchFailure(_) => FailureReason::Transport,
        SdkError::ServiceError(context) => classify_service(context.err()),
        _ => FailureReason::Transport,
    }
}

fn classify_service(err: &InvokeModelError) -> FailureReason {
    if err.is_access_denied_exception() {
        FailureReason::Authentication
    } else if err.is_throttling_exception() {
        FailureReason::Throttled
    } else if err.is_model_timeout_exception() {
        FailureReason::Timeout
    } else if err.is_validation_exception() || err.is_resource_not_found_exception() {
        FailureReason::Rejected
    } else {
        FailureReason::Service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockruntime::config::retry::RetryConfig;
    use aws_sdk_bedrockruntime::config::{BehaviorVersion, Credentials, Region};
    use aws_sdk_bedrockruntime::types::error::{
        AccessDeniedException, ThrottlingException, ValidationException,
    };
    use httpmock::prelude::*;
    use serde_json::json;

    fn local_client(base_url: String) -> BedrockClient {
        let config = aws_sdk_bedrockruntime::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("ap-southeast-1"))
            .endpoint_url(base_url)
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .build();
        BedrockClient::new(Client::from_conf(config), "nova-test")
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn invokes_model_with_user_message() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/model/nova-test/invoke")
                .header("content-type", "application/json")
                .body_contains(r#""role":"user""#)
                .body_contains("review these findings");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"output": [{"text": "All clear"}]}));
        });

        let reply = local_client(server.base_url())
            .complete("review these findings")
            .await
            .unwrap();
        mock.assert();
        assert_eq!(reply, json!({"output": [{"text": "All clear"}]}));
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn throttled_invocation_is_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/model/nova-test/invoke");
            then.status(429)
                .header("x-amzn-ErrorType", "ThrottlingException")
                .json_body(json!({"message": "Too many requests"}));
        });

        let err = local_client(server.base_url())
            .complete("prompt")
            .await
            .unwrap_err();
        assert_eq!(err.provider, ProviderKind::Bedrock);
        assert_eq!(err.reason, FailureReason::Throttled);
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/model/nova-test/invoke");
            then.status(200).body("not json");
        });

        let err = local_client(server.base_url())
            .complete("prompt")
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::MalformedReply);
    }

    #[test]
    fn service_errors_map_to_reasons() {
        let denied = InvokeModelError::AccessDeniedException(
            AccessDeniedException::builder().message("no").build(),
        );
        assert_eq!(classify_service(&denied), FailureReason::Authentication);

        let throttled = InvokeModelError::ThrottlingException(
            ThrottlingException::builder().message("slow").build(),
        );
        assert_eq!(classify_service(&throttled), FailureReason::Throttled);

        let invalid = InvokeModelError::ValidationException(
            ValidationException::builder().message("bad").build(),
        );
        assert_eq!(classify_service(&invalid), FailureReason::Rejected);
    }
}
