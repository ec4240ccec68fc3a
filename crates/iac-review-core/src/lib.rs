pub mod aws;
pub mod condense;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod review;
pub mod scanner;
pub mod storage;

pub use condense::{condense, CondensedFindings, CondensedViolations};
pub use error::{FailureClass, PipelineError};
pub use llm::{LlmProfile, LlmSettings, ProviderKind, SummaryClient, SummaryError};
pub use pipeline::{Pipeline, RunReport, Stage, Verdict};
pub use report::{Console, Palette};
pub use review::{request_review, Degradation, ModelReply, ReviewOutcome};
pub use scanner::{terrascan::TerrascanRunner, ScanCapture, ScanDocument, ScanRunner};
pub use storage::{
    ArtifactKind, ArtifactName, ArtifactSink, ArtifactStore, Destination, LocalSink, RunTimestamp,
    S3Sink, StorageProfile, StorageSettings,
};
