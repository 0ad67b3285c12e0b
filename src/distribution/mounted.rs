//! Mounted file share

use super::types::{destination_key, DistributionPoint};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::{Path, PathBuf};
use tracing::info;

/// A share (AFP, SMB, NFS) that is already mounted locally
#[derive(Debug)]
pub struct MountedShare {
    name: String,
    mount_point: PathBuf,
    store: LocalFileSystem,
}

impl MountedShare {
    /// Open a mounted share; the mount point must exist
    pub fn new(name: impl Into<String>, mount_point: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let mount_point = mount_point.into();

        if !mount_point.is_dir() {
            return Err(Error::distribution(
                &name,
                format!("{} is not mounted", mount_point.display()),
            ));
        }

        let store = LocalFileSystem::new_with_prefix(&mount_point)
            .map_err(|e| Error::distribution(&name, format!("Failed to open share: {e}")))?;

        Ok(Self {
            name,
            mount_point,
            store,
        })
    }

    /// Local mount point
    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

#[async_trait]
impl DistributionPoint for MountedShare {
    fn name(&self) -> &str {
        &self.name
    }

    async fn copy(&self, file: &Path) -> Result<String> {
        let filename = file_name(file)?;
        let key = destination_key(filename);

        let data = tokio::fs::read(file).await.map_err(|e| {
            Error::distribution(&self.name, format!("Failed to read {}: {e}", file.display()))
        })?;

        self.store
            .put(&ObjectPath::from(key.as_str()), Bytes::from(data).into())
            .await
            .map_err(|e| Error::distribution(&self.name, format!("Failed to write {key}: {e}")))?;

        let destination = self.mount_point.join(&key).display().to_string();
        info!("Copied {filename} to {destination}");
        Ok(destination)
    }

    async fn exists(&self, filename: &str) -> Result<bool> {
        let location = ObjectPath::from(destination_key(filename).as_str());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::distribution(&self.name, e.to_string())),
        }
    }

    async fn delete(&self, filename: &str) -> Result<()> {
        let key = destination_key(filename);
        match self.store.delete(&ObjectPath::from(key.as_str())).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::distribution(&self.name, format!("Failed to delete {key}: {e}"))),
        }
    }
}

/// Final path component as UTF-8
pub(crate) fn file_name(file: &Path) -> Result<&str> {
    file.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::FileNotFound {
            path: file.display().to_string(),
        })
}
