//! S3-compatible object fetch (MinIO) for the PDF ingest adapter (§6).
//! `aws-sdk-s3` is configured against a custom endpoint, the standard way
//! to target MinIO from the official AWS SDK.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;

use crate::error::PdfExtractionError;

#[async_trait]
pub trait ObjectStoreClient: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, bucket: &str, object_path: &str) -> Result<Vec<u8>, PdfExtractionError>;
}

#[derive(Debug)]
pub struct MinioObjectStore {
    client: Client,
}

impl MinioObjectStore {
    /// Builds a client pointed at a MinIO endpoint using static
    /// credentials; `endpoint` is the MinIO base URL (e.g.
    /// `http://minio:9000`).
    pub fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "plagiarism-detector");
        let config = aws_sdk_s3::Config::builder()
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for MinioObjectStore {
    async fn fetch(&self, bucket: &str, object_path: &str) -> Result<Vec<u8>, PdfExtractionError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(object_path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    PdfExtractionError::ObjectNotFound {
                        bucket: bucket.to_string(),
                        object_path: object_path.to_string(),
                    }
                } else {
                    PdfExtractionError::ObjectStore(e.to_string())
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| PdfExtractionError::ObjectStore(e.to_string()))?
            .into_bytes();

        Ok(bytes.to_vec())
    }
}
