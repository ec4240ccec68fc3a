use std::fmt;

use thiserror::Error;

use crate::storage::ArtifactKind;

/// Broad failure classes that terminate a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Invocation,
    Configuration,
    Persistence,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Invocation => "invocation",
            Self::Configuration => "configuration",
            Self::Persistence => "persistence",
        };
        f.write_str(label)
    }
}

/// Fatal errors raised by the review pipeline. Every variant halts the run.
///
/// Messages exclude the underlying cause; render with `{:#}` through
/// `anyhow` to print the full chain.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to launch scanner `{program}`")]
    ScannerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scanner output is not a valid scan document")]
    UnparsableOutput {
        #[source]
        source: serde_json::Error,
    },
    #[error("{message}")]
    InvalidTarget { iac_type: String, message: String },
    #[error("failed to write {kind} artifact to {location}")]
    Persistence {
        kind: ArtifactKind,
        location: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::ScannerLaunch { .. } | Self::UnparsableOutput { .. } => FailureClass::Invocation,
            Self::InvalidTarget { .. } => FailureClass::Configuration,
            Self::Persistence { .. } => FailureClass::Persistence,
        }
    }
}
