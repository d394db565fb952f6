use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::store::{BlobStore, StoreError};

/// S3 / MinIO bucket whose objects are served publicly from `public_base_url`.
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Blob(format!("S3 upload failed: {e}")))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(self.public_url(key))
    }
}

/// Object key for an uploaded base resume, keeping the original extension.
pub fn resume_upload_key(user_id: uuid::Uuid, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("resumes/{}/{}.{}", user_id, uuid::Uuid::new_v4(), ext)
}

pub fn portfolio_key(slug: &str) -> String {
    format!("portfolios/{slug}/index.html")
}
