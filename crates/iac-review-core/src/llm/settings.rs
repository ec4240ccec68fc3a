use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::ProviderKind;

pub const DEFAULT_MODEL: &str = "amazon.nova-micro-v1:0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Optional overrides read from the `[llm]` section of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmProfile {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub timeout: Option<String>,
}

/// Resolved configuration for the summarization client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
    pub timeout: Duration,
}

impl LlmSettings {
    const PROVIDER_ENV: &'static str = "IAC_REVIEW_PROVIDER";
    const MODEL_ENV: &'static str = "IAC_REVIEW_MODEL";
    const ENDPOINT_ENV: &'static str = "IAC_REVIEW_ENDPOINT";
    const API_KEY_ENV: &'static str = "IAC_REVIEW_API_KEY";
    const REGION_ENV: &'static str = "IAC_REVIEW_REGION";
    const TIMEOUT_ENV: &'static str = "IAC_REVIEW_TIMEOUT";

    /// Resolve settings from the process environment layered over `profile`.
    ///
    /// * `IAC_REVIEW_PROVIDER` — `bedrock` (default), `http`, or `noop`.
    /// * `IAC_REVIEW_ENDPOINT` — URL for the `http` provider (required there).
    /// * `IAC_REVIEW_TIMEOUT`  — request timeout, e.g. `45s` or `45`.
    pub fn from_env(profile: &LlmProfile) -> Result<Self> {
        Self::from_map(&std::env::vars().collect(), profile)
    }

    pub fn from_map(vars: &HashMap<String, String>, profile: &LlmProfile) -> Result<Self> {
        let pick = |env: &str, fallback: &Option<String>| {
            non_blank(vars.get(env)).or_else(|| non_blank(fallback.as_ref()))
        };

        let provider = match pick(Self::PROVIDER_ENV, &profile.provider) {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => ProviderKind::Bedrock,
        };
        let model = pick(Self::MODEL_ENV, &profile.model).unwrap_or_else(|| match provider {
            ProviderKind::Noop => "noop".to_string(),
            _ => DEFAULT_MODEL.to_string(),
        });
        let endpoint = pick(Self::ENDPOINT_ENV, &profile.endpoint);
        let api_key = non_blank(vars.get(Self::API_KEY_ENV));
        let region = pick(Self::REGION_ENV, &profile.region);
        let timeout = match pick(Self::TIMEOUT_ENV, &profile.timeout) {
            Some(raw) => parse_timeout(&raw, "summarization")?,
            None => DEFAULT_TIMEOUT,
        };

        if provider == ProviderKind::Http && endpoint.is_none() {
            bail!(
                "the http provider requires an endpoint via {} or `llm.endpoint`",
                Self::ENDPOINT_ENV
            );
        }

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            region,
            timeout,
        })
    }
}

pub(crate) fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Bare integers are seconds; anything else goes through humantime.
pub(crate) fn parse_timeout(raw: &str, what: &str) -> Result<Duration> {
    let timeout = match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(raw)
            .with_context(|| format!("invalid {what} timeout `{raw}`"))?,
    };
    if timeout.is_zero() {
        bail!("{what} timeout must be greater than zero");
    }
    Ok(timeout)
}
