//! Distribution point types

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Extensions stored under `Packages/`; everything else goes to `Scripts/`
pub const PACKAGE_EXTENSIONS: [&str; 3] = ["pkg", "dmg", "zip"];

/// Default upload part size for cloud points (8 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Default number of parts in flight for cloud points
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Whether a file is a package by its extension
pub fn is_package(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PACKAGE_EXTENSIONS.iter().any(|p| ext.eq_ignore_ascii_case(p)))
}

/// Location of a file on a distribution point, relative to its root
pub fn destination_key(filename: &str) -> String {
    let folder = if is_package(filename) {
        "Packages"
    } else {
        "Scripts"
    };
    format!("{folder}/{filename}")
}

/// A file share or bucket packages and scripts are copied to
#[async_trait]
pub trait DistributionPoint: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Copy a local file; returns where it was written
    async fn copy(&self, file: &Path) -> Result<String>;

    /// Whether a file with this name is present
    async fn exists(&self, filename: &str) -> Result<bool>;

    /// Remove a file by name; a missing file is not an error
    async fn delete(&self, filename: &str) -> Result<()>;
}

/// Connection settings for one distribution point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepoConfig {
    /// File share already mounted on this machine
    Mounted {
        /// Point name
        name: String,
        /// Mount point, e.g. `/Volumes/CasperShare`
        path: String,
    },
    /// Cloud bucket: `s3://`, `gs://` or `az://`
    Cloud {
        /// Point name
        name: String,
        /// Bucket URL with optional prefix
        url: String,
        /// Upload part size in bytes
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
        /// Parts uploaded at once
        #[serde(default = "default_max_concurrency")]
        max_concurrency: usize,
    },
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl RepoConfig {
    /// Point name
    pub fn name(&self) -> &str {
        match self {
            RepoConfig::Mounted { name, .. } | RepoConfig::Cloud { name, .. } => name,
        }
    }
}

/// Outcome of an operation fanned out to every point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
    /// Point name to the location written or removed
    pub succeeded: BTreeMap<String, String>,
    /// Point name to the error message
    pub failed: BTreeMap<String, String>,
}

impl DistributionReport {
    /// True when no point failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
