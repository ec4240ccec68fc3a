use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::llm::{non_blank, parse_timeout};

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Optional overrides read from the `[storage]` section of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageProfile {
    pub region: Option<String>,
    pub timeout: Option<String>,
}

/// Resolved object-store client settings, separate from the summarization provider's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// `None` leaves the region to the default AWS provider chain.
    pub region: Option<String>,
    pub timeout: Duration,
}

impl StorageSettings {
    const REGION_ENV: &'static str = "IAC_REVIEW_STORAGE_REGION";
    const TIMEOUT_ENV: &'static str = "IAC_REVIEW_STORAGE_TIMEOUT";

    pub fn from_map(vars: &HashMap<String, String>, profile: &StorageProfile) -> Result<Self> {
        let pick = |env: &str, fallback: &Option<String>| {
            non_blank(vars.get(env)).or_else(|| non_blank(fallback.as_ref()))
        };

        let timeout = match pick(Self::TIMEOUT_ENV, &profile.timeout) {
            Some(raw) => parse_timeout(&raw, "storage")?,
            None => DEFAULT_STORAGE_TIMEOUT,
        };
        Ok(Self {
            region: pick(Self::REGION_ENV, &profile.region),
            timeout,
        })
    }
}
