use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;

pub mod terrascan;
pub mod validate;

/// IaC type whose scan errors mean the scan root holds no usable configuration.
pub const TERRAFORM_IAC_TYPE: &str = "terraform";

/// Entry of `results.scan_errors` reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanErrorEntry {
    #[serde(default)]
    pub iac_type: Option<String>,
    #[serde(rename = "errMsg", default)]
    pub err_msg: Option<String>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    results: Option<RawResults>,
    #[serde(default)]
    violations: Option<Vec<Value>>,
}

#[derive(Deserialize, Default)]
struct RawResults {
    #[serde(default)]
    scan_errors: Option<Vec<ScanErrorEntry>>,
    #[serde(default)]
    scan_summary: Option<Map<String, Value>>,
    #[serde(default)]
    violations: Option<Vec<Value>>,
}

/// Parsed scanner output. The raw document is kept untouched so it can be
/// persisted exactly as the scanner produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanDocument {
    raw: Value,
    scan_errors: Vec<ScanErrorEntry>,
    scan_summary: Option<Map<String, Value>>,
    violated_policies: u64,
    violations: Vec<Value>,
}

impl ScanDocument {
    /// Parse scanner stdout into a document.
    ///
    /// Top-level `violations` wins; `results.violations` is used when the
    /// top-level field is missing.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(input)?;
        Self::from_value(raw)
    }

    /// A `violated_policies` count that is present but not a non-negative
    /// integer is rejected; only an absent count reads as zero.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        let parsed = RawDocument::deserialize(&raw)?;
        let results = parsed.results.unwrap_or_default();
        let violated_policies = match results
            .scan_summary
            .as_ref()
            .and_then(|summary| summary.get("violated_policies"))
        {
            Some(count) => u64::deserialize(count)?,
            None => 0,
        };
        let violations = parsed
            .violations
            .or(results.violations)
            .unwrap_or_default();
        Ok(Self {
            scan_errors: results.scan_errors.unwrap_or_default(),
            scan_summary: results.scan_summary,
            violated_policies,
            violations,
            raw,
        })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn scan_errors(&self) -> &[ScanErrorEntry] {
        &self.scan_errors
    }

    pub fn scan_summary(&self) -> Option<&Map<String, Value>> {
        self.scan_summary.as_ref()
    }

    pub fn violations(&self) -> &[Value] {
        &self.violations
    }

    /// Number of violated policies; a missing summary or count reads as zero.
    pub fn violated_policies(&self) -> u64 {
        self.violated_policies
    }

    /// Serialize the full document for the scan artifact.
    pub fn to_artifact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.raw)
    }
}

/// Output captured from one scanner process. The exit code is informational:
/// the scanner exits non-zero whenever it reports findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCapture {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ScanCapture {
    pub fn parse(&self) -> Result<ScanDocument, PipelineError> {
        ScanDocument::from_json(&self.stdout)
            .map_err(|source| PipelineError::UnparsableOutput { source })
    }
}

/// Runs the external scanner and captures its output.
#[async_trait]
pub trait ScanRunner: Send + Sync {
    async fn run(&self) -> Result<ScanCapture, PipelineError>;
}
