use std::io::Write;

use tracing::{debug, info};

use crate::condense::condense;
use crate::error::PipelineError;
use crate::llm::SummaryClient;
use crate::report::Console;
use crate::review::{request_review, Degradation, ReviewOutcome};
use crate::scanner::validate::validate_target;
use crate::scanner::ScanRunner;
use crate::storage::{ArtifactKind, ArtifactSink, ArtifactStore, RunTimestamp};

/// Checkpoints of a run, in order. A fatal error stops at the last one reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ScanRan,
    Validated,
    Summarized,
    ReviewPersisted,
    ScanPersisted,
    Finished,
}

fn reached(stage: Stage) {
    debug!(?stage, "pipeline stage reached");
}

/// Pass/fail decision of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed { violated_policies: u64 },
}

impl Verdict {
    pub fn from_violations(violated_policies: u64) -> Self {
        if violated_policies > 0 {
            Self::Failed { violated_policies }
        } else {
            Self::Passed
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            Self::Passed => 0,
            Self::Failed { .. } => 1,
        }
    }
}

/// Result of a run that reached a verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub verdict: Verdict,
    pub review: ReviewOutcome,
    pub review_location: String,
    pub scan_location: Option<String>,
}

/// Scan → validate → condense → summarize → persist → verdict.
pub struct Pipeline<'a> {
    runner: &'a dyn ScanRunner,
    summarizer: &'a dyn SummaryClient,
    sink: &'a dyn ArtifactSink,
    timestamp: Option<RunTimestamp>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        runner: &'a dyn ScanRunner,
        summarizer: &'a dyn SummaryClient,
        sink: &'a dyn ArtifactSink,
    ) -> Self {
        Self {
            runner,
            summarizer,
            sink,
            timestamp: None,
        }
    }

    /// Pin the artifact timestamp instead of reading the clock after summarization.
    pub fn with_timestamp(mut self, timestamp: RunTimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub async fn run<W: Write>(&self, console: &mut Console<W>) -> Result<RunReport, PipelineError> {
        reached(Stage::Start);
        console.step(1, "Running local Terrascan scan...");
        let capture = self.runner.run().await?;
        let doc = capture.parse()?;
        reached(Stage::ScanRan);

        validate_target(&doc)?;
        reached(Stage::Validated);

        console.step(2, "Generating AI Security Review...");
        let condensed = condense(&doc);
        let review = request_review(self.summarizer, &condensed).await;
        if let Some(Degradation::ServiceFailure(err)) = &review.degradation {
            console.warning(&format!("Error getting AI review: {err}"));
        }
        reached(Stage::Summarized);

        let store = ArtifactStore::new(
            self.sink,
            self.timestamp.unwrap_or_else(RunTimestamp::now),
        );
        let review_location = store
            .persist(ArtifactKind::Review, review.text.clone().into_bytes())
            .await?;
        console.saved("AI Review", &review_location);
        reached(Stage::ReviewPersisted);

        console.final_review(&review.text);

        let verdict = Verdict::from_violations(doc.violated_policies());
        let scan_location = match verdict {
            Verdict::Failed { violated_policies } => {
                let body = doc
                    .to_artifact_json()
                    .map_err(|source| PipelineError::Persistence {
                        kind: ArtifactKind::Scan,
                        location: store.locate(ArtifactKind::Scan),
                        source: source.into(),
                    })?;
                let location = store.persist(ArtifactKind::Scan, body.into_bytes()).await?;
                console.saved("Scan results", &location);
                reached(Stage::ScanPersisted);
                console.failed(violated_policies);
                Some(location)
            }
            Verdict::Passed => {
                console.passed();
                None
            }
        };
        reached(Stage::Finished);
        info!(?verdict, degraded = review.is_degraded(), "review pipeline finished");

        Ok(RunReport {
            verdict,
            review,
            review_location,
            scan_location,
        })
    }
}
