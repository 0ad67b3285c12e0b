//! Cloud storage distribution points (S3, GCS, Azure)

use super::mounted::file_name;
use super::types::{destination_key, DistributionPoint, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENCY};
use crate::error::{Error, Result};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, WriteMultipart};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Bucket that receives files in chunked multipart uploads
#[derive(Debug, Clone)]
pub struct CloudDistributionPoint {
    name: String,
    store: Arc<dyn ObjectStore>,
    scheme: String,
    bucket: String,
    prefix: String,
    chunk_size: usize,
    max_concurrency: usize,
}

impl CloudDistributionPoint {
    /// Parse a bucket URL and create the matching store
    ///
    /// Supported formats:
    /// - `s3://bucket/prefix/` - AWS S3
    /// - `gs://bucket/prefix/` - Google Cloud Storage
    /// - `az://container/prefix/` - Azure Blob Storage
    ///
    /// Credentials come from the environment, as each SDK expects.
    pub fn parse(name: impl Into<String>, url: &str) -> Result<Self> {
        let (scheme, bucket, _) = split_url(url)?;

        let store: Arc<dyn ObjectStore> = match scheme {
            "s3" => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?,
            ),
            "gs" => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            "az" => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
            other => {
                return Err(Error::config(format!(
                    "Unsupported distribution point scheme '{other}' in {url}"
                )))
            }
        };

        Self::with_store(name, store, url)
    }

    /// Use an existing store for the bucket named by `url`
    pub fn with_store(
        name: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        url: &str,
    ) -> Result<Self> {
        let (scheme, bucket, prefix) = split_url(url)?;
        Ok(Self {
            name: name.into(),
            store,
            scheme: scheme.to_string(),
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Set the upload part size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set how many parts may be in flight at once
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// URL scheme (s3, gs, az)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn location(&self, filename: &str) -> ObjectPath {
        let key = destination_key(filename);
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix))
        }
    }

    async fn stream_file(&self, writer: &mut WriteMultipart, file: &Path) -> Result<usize> {
        let mut source = tokio::fs::File::open(file).await.map_err(|e| {
            Error::distribution(&self.name, format!("Failed to open {}: {e}", file.display()))
        })?;

        let mut buffer = vec![0_u8; self.chunk_size];
        let mut total = 0;
        loop {
            let read = source.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            writer
                .wait_for_capacity(self.max_concurrency)
                .await
                .map_err(|e| Error::distribution(&self.name, format!("Upload failed: {e}")))?;
            writer.write(&buffer[..read]);
            total += read;
        }
        Ok(total)
    }
}

#[async_trait]
impl DistributionPoint for CloudDistributionPoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn copy(&self, file: &Path) -> Result<String> {
        let filename = file_name(file)?;
        let location = self.location(filename);

        let upload = self
            .store
            .put_multipart(&location)
            .await
            .map_err(|e| Error::distribution(&self.name, format!("Failed to start upload: {e}")))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, self.chunk_size);

        match self.stream_file(&mut writer, file).await {
            Ok(total) => {
                writer.finish().await.map_err(|e| {
                    Error::distribution(&self.name, format!("Failed to complete upload: {e}"))
                })?;
                let destination = format!("{}://{}/{location}", self.scheme, self.bucket);
                debug!("Uploaded {total} bytes");
                info!("Copied {filename} to {destination}");
                Ok(destination)
            }
            Err(e) => {
                if let Err(abort) = writer.abort().await {
                    warn!("Failed to abort upload of {location}: {abort}");
                }
                Err(e)
            }
        }
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        match self.store.head(&self.location(filename)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::distribution(&self.name, e.to_string())),
        }
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let location = self.location(filename);
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::distribution(
                &self.name,
                format!("Failed to delete {location}: {e}"),
            )),
        }
    }
}

/// Split `scheme://bucket/prefix/` into its parts
fn split_url(url: &str) -> Result<(&str, &str, &str)> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| Error::config(format!("Invalid distribution point URL: {url}")))?;

    let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(Error::config(format!("Missing bucket in {url}")));
    }
    Ok((scheme, bucket, prefix.trim_matches('/')))
}
