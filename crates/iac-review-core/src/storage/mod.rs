use std::fmt;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument};

use crate::error::PipelineError;

pub mod local;
pub mod s3;
mod settings;

pub use local::LocalSink;
pub use s3::S3Sink;
pub use settings::{StorageProfile, StorageSettings, DEFAULT_STORAGE_TIMEOUT};

/// Logical artifact produced by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Markdown summary from the summarization service.
    Review,
    /// Full scanner document, written only when violations were found.
    Scan,
}

impl ArtifactKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Scan => "scan",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Review => "md",
            Self::Scan => "json",
        }
    }

    /// Top-level object-store partition.
    pub fn partition(self) -> &'static str {
        match self {
            Self::Review => "reviews",
            Self::Scan => "scans",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Review => "text/markdown; charset=utf-8",
            Self::Scan => "application/json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Wall-clock instant shared by every artifact of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTimestamp(NaiveDateTime);

impl RunTimestamp {
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    pub fn from_naive(at: NaiveDateTime) -> Self {
        Self(at)
    }

    /// `YYYYMMDD_HHMMSS`
    pub fn file_stamp(&self) -> String {
        self.0.format("%Y%m%d_%H%M%S").to_string()
    }

    /// `YYYY/MM/DD`
    pub fn date_partition(&self) -> String {
        self.0.format("%Y/%m/%d").to_string()
    }
}

/// Deterministic name of one artifact within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName {
    pub kind: ArtifactKind,
    pub timestamp: RunTimestamp,
}

impl ArtifactName {
    /// `review_20240102_030405.md`
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            self.kind.prefix(),
            self.timestamp.file_stamp(),
            self.kind.extension()
        )
    }

    /// `reviews/2024/01/02/review_20240102_030405.md`
    pub fn object_key(&self) -> String {
        format!(
            "{}/{}/{}",
            self.kind.partition(),
            self.timestamp.date_partition(),
            self.file_name()
        )
    }
}

/// Where the artifacts of a run go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Local,
    ObjectStore { bucket: String },
}

impl Destination {
    /// Blank bucket names select the local filesystem.
    pub fn from_bucket(bucket: Option<String>) -> Self {
        match bucket.map(|b| b.trim().to_string()) {
            Some(bucket) if !bucket.is_empty() => Self::ObjectStore { bucket },
            _ => Self::Local,
        }
    }
}

/// Byte sink for artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Path or URI the artifact is written to, for confirmations and errors.
    fn locate(&self, name: &ArtifactName) -> String;

    async fn put(&self, name: &ArtifactName, body: Vec<u8>) -> anyhow::Result<()>;
}

/// Writes the artifacts of a single run under one timestamp.
pub struct ArtifactStore<'a> {
    sink: &'a dyn ArtifactSink,
    timestamp: RunTimestamp,
}

impl<'a> ArtifactStore<'a> {
    pub fn new(sink: &'a dyn ArtifactSink, timestamp: RunTimestamp) -> Self {
        Self { sink, timestamp }
    }

    pub fn locate(&self, kind: ArtifactKind) -> String {
        self.sink.locate(&self.name(kind))
    }

    fn name(&self, kind: ArtifactKind) -> ArtifactName {
        ArtifactName {
            kind,
            timestamp: self.timestamp,
        }
    }

    /// Write `body` as `kind`, returning its location. Failures are fatal.
    #[instrument(name = "persist_artifact", skip(self, body), fields(bytes = body.len()))]
    pub async fn persist(&self, kind: ArtifactKind, body: Vec<u8>) -> Result<String, PipelineError> {
        let name = self.name(kind);
        let location = self.sink.locate(&name);
        match self.sink.put(&name, body).await {
            Ok(()) => {
                info!(%kind, %location, "artifact written");
                Ok(location)
            }
            Err(source) => Err(PipelineError::Persistence {
                kind,
                location,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> RunTimestamp {
        RunTimestamp::from_naive(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(7, 8, 9)
                .unwrap(),
        )
    }

    #[test]
    fn file_names_use_compact_timestamp() {
        let review = ArtifactName {
            kind: ArtifactKind::Review,
            timestamp: stamp(),
        };
        let scan = ArtifactName {
            kind: ArtifactKind::Scan,
            timestamp: stamp(),
        };
        assert_eq!(review.file_name(), "review_20240305_070809.md");
        assert_eq!(scan.file_name(), "scan_20240305_070809.json");
    }

    #[test]
    fn object_keys_are_partitioned_by_date() {
        let review = ArtifactName {
            kind: ArtifactKind::Review,
            timestamp: stamp(),
        };
        let scan = ArtifactName {
            kind: ArtifactKind::Scan,
            timestamp: stamp(),
        };
        assert_eq!(
            review.object_key(),
            "reviews/2024/03/05/review_20240305_070809.md"
        );
        assert_eq!(scan.object_key(), "scans/2024/03/05/scan_20240305_070809.json");
    }

    #[test]
    fn destination_from_bucket_flag() {
        assert_eq!(Destination::from_bucket(None), Destination::Local);
        assert_eq!(Destination::from_bucket(Some("  ".into())), Destination::Local);
        assert_eq!(
            Destination::from_bucket(Some("my-bucket".into())),
            Destination::ObjectStore {
                bucket: "my-bucket".into()
            }
        );
    }

    struct RejectingSink;

    #[async_trait]
    impl ArtifactSink for RejectingSink {
        fn locate(&self, name: &ArtifactName) -> String {
            format!("mem://{}", name.file_name())
        }

        async fn put(&self, _name: &ArtifactName, _body: Vec<u8>) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[tokio::test]
    async fn persist_failures_are_fatal() {
        let sink = RejectingSink;
        let store = ArtifactStore::new(&sink, stamp());
        let err = store
            .persist(ArtifactKind::Review, b"summary".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.class(), crate::error::FailureClass::Persistence);
        assert!(err.to_string().contains("mem://review_20240305_070809.md"));
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert_eq!(cause, "disk full");
    }

    #[test]
    fn store_locates_without_writing() {
        let sink = RejectingSink;
        let store = ArtifactStore::new(&sink, stamp());
        assert_eq!(
            store.locate(ArtifactKind::Scan),
            "mem://scan_20240305_070809.json"
        );
    }
}
