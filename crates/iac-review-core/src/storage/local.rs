use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use super::{ArtifactName, ArtifactSink};

/// Writes artifacts as flat files in one directory (the working directory by default).
#[derive(Debug, Clone)]
pub struct LocalSink {
    root: PathBuf,
}

impl LocalSink {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &ArtifactName) -> PathBuf {
        self.root.join(name.file_name())
    }
}

#[async_trait]
impl ArtifactSink for LocalSink {
    fn locate(&self, name: &ArtifactName) -> String {
        self.path_for(name).display().to_string()
    }

    async fn put(&self, name: &ArtifactName, body: Vec<u8>) -> anyhow::Result<()> {
        let path = self.path_for(name);
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ArtifactKind, RunTimestamp};

    #[tokio::test]
    async fn writes_flat_file_in_root() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(dir.path());
        let name = ArtifactName {
            kind: ArtifactKind::Review,
            timestamp: RunTimestamp::now(),
        };
        sink.put(&name, b"All clear".to_vec()).await.unwrap();

        let path = dir.path().join(name.file_name());
        assert_eq!(sink.locate(&name), path.display().to_string());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "All clear");
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalSink::new(dir.path().join("does-not-exist"));
        let name = ArtifactName {
            kind: ArtifactKind::Scan,
            timestamp: RunTimestamp::now(),
        };
        let err = sink.put(&name, b"{}".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
