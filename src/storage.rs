use async_trait::async_trait;
use aws_sdk_s3::{self as s3};
use s3::primitives::ByteStream;

use crate::error::ExportError;

const REPORT_CONTENT_TYPE: &str = "text/csv";

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Every object key currently in the report bucket.
    async fn list_keys(&self) -> Result<Vec<String>, ExportError>;

    async fn put_report(&self, key: &str, body: Vec<u8>) -> Result<(), ExportError>;
}

pub fn s3_client(config: &aws_config::SdkConfig, use_path_style_buckets: bool) -> s3::Client {
    let client = s3::Client::new(config);

    if use_path_style_buckets {
        tracing::info!("Using path-style buckets");
        let config_builder = client.config().clone().to_builder();
        s3::Client::from_conf(config_builder.force_path_style(true).build())
    } else {
        client
    }
}

pub struct S3ReportStore {
    client: s3::Client,
    bucket: String,
}

impl S3ReportStore {
    pub fn new(client: s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ReportStore for S3ReportStore {
    async fn list_keys(&self) -> Result<Vec<String>, ExportError> {
        let mut keys = vec![];
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| ExportError::storage(s3::Error::from(err)))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );
        }

        tracing::info!("Found {} objects in bucket {}", keys.len(), self.bucket);
        Ok(keys)
    }

    async fn put_report(&self, key: &str, body: Vec<u8>) -> Result<(), ExportError> {
        tracing::info!("Uploading {} ({} bytes) to bucket {}", key, body.len(), self.bucket);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(REPORT_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| ExportError::storage(s3::Error::from(err)))?;

        Ok(())
    }
}
