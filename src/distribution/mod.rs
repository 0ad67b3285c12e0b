//! Distribution points for packages and scripts
//!
//! Files are fanned out to every configured point. Packages (`.pkg`,
//! `.dmg`, `.zip`) land in `Packages/`, everything else in `Scripts/`.
//!
//! ```rust,ignore
//! let points = DistributionPoints::from_configs(&config.repos)?;
//! let report = points.copy(Path::new("Firefox.pkg")).await;
//! assert!(report.is_complete());
//! ```

mod cloud;
mod mounted;
mod types;

pub use cloud::CloudDistributionPoint;
pub use mounted::MountedShare;
pub use types::*;

use crate::error::Result;
use futures::future::join_all;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Every distribution point files are copied to
#[derive(Clone, Default)]
pub struct DistributionPoints {
    points: Vec<Arc<dyn DistributionPoint>>,
}

impl DistributionPoints {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Open every configured point
    pub fn from_configs(configs: &[RepoConfig]) -> Result<Self> {
        let mut points = Self::new();
        for config in configs {
            let point: Arc<dyn DistributionPoint> = match config {
                RepoConfig::Mounted { name, path } => Arc::new(MountedShare::new(name, path)?),
                RepoConfig::Cloud {
                    name,
                    url,
                    chunk_size,
                    max_concurrency,
                } => Arc::new(
                    CloudDistributionPoint::parse(name, url)?
                        .with_chunk_size(*chunk_size)
                        .with_max_concurrency(*max_concurrency),
                ),
            };
            points.add(point);
        }
        Ok(points)
    }

    /// Add a point
    pub fn add(&mut self, point: Arc<dyn DistributionPoint>) {
        self.points.push(point);
    }

    /// Remove a point by name; returns whether one was removed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.name() != name);
        self.points.len() != before
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point names in configuration order
    pub fn names(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.name()).collect()
    }

    /// Copy a file to every point
    pub async fn copy(&self, file: &Path) -> DistributionReport {
        let results = join_all(self.points.iter().map(|p| p.copy(file))).await;
        self.report(results)
    }

    /// True only when every point has the file
    pub async fn exists(&self, filename: &str) -> Result<bool> {
        if self.points.is_empty() {
            return Ok(false);
        }
        for point in &self.points {
            if !point.exists(filename).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Delete a file from every point
    pub async fn delete(&self, filename: &str) -> DistributionReport {
        let results = join_all(self.points.iter().map(|p| async move {
            p.delete(filename).await.map(|()| filename.to_string())
        }))
        .await;
        self.report(results)
    }

    fn report(&self, results: Vec<Result<String>>) -> DistributionReport {
        let mut report = DistributionReport::default();
        for (point, result) in self.points.iter().zip(results) {
            match result {
                Ok(location) => {
                    report.succeeded.insert(point.name().to_string(), location);
                }
                Err(e) => {
                    warn!("{e}");
                    report.failed.insert(point.name().to_string(), e.to_string());
                }
            }
        }
        report
    }
}

impl fmt::Debug for DistributionPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
