use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use super::{ArtifactName, ArtifactSink};
use crate::aws::load_sdk_config;

/// Writes artifacts as objects under date-partitioned keys in one bucket.
#[derive(Debug, Clone)]
pub struct S3Sink {
    client: Client,
    bucket: String,
}

impl S3Sink {
    pub async fn connect(bucket: impl Into<String>, region: Option<&str>, timeout: Duration) -> Self {
        let sdk_config = load_sdk_config(region, timeout).await;
        Self::new(Client::new(&sdk_config), bucket)
    }

    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ArtifactSink for S3Sink {
    fn locate(&self, name: &ArtifactName) -> String {
        format!("s3://{}/{}", self.bucket, name.object_key())
    }

    async fn put(&self, name: &ArtifactName, body: Vec<u8>) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name.object_key())
            .content_type(name.kind.content_type())
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| anyhow::anyhow!("{}", DisplayErrorContext(&err)))
            .with_context(|| format!("S3 PutObject to bucket `{}` failed", self.bucket))?;
        Ok(())
    }
}
