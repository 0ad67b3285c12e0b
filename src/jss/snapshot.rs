//! Bulk snapshot of server records

use crate::error::{Result, ResultExt};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Every record of a set of resource types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Full records per resource type
    pub records: BTreeMap<String, Vec<JsonValue>>,
    /// Error message per resource type that could not be fetched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl Snapshot {
    /// Total number of records across all types
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// True when every requested type was fetched
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Write the records as `{ kind: [record, ...] }` JSON
    pub async fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.records)?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .with_context(|| format!("Failed to write snapshot {}", temp_path.display()))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .context("Failed to rename snapshot file")?;

        Ok(())
    }
}
