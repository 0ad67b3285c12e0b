//! Ordered collection of summary records

use super::types::SummaryRecord;
use crate::catalog::ResourceDescriptor;
use crate::decode::Document;
use crate::error::{Error, Result};
use crate::jss::Jss;
use crate::query::QueryOptions;
use crate::resource::{Resource, Seed};
use crate::types::JsonValue;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reserved listing child holding the entry count
const SIZE_TAG: &str = "size";

/// Summary records of one resource type, in server response order
#[derive(Debug, Clone)]
pub struct SummarySet {
    jss: Jss,
    descriptor: Arc<ResourceDescriptor>,
    records: Vec<SummaryRecord>,
}

impl SummarySet {
    /// Wrap records that were already read
    pub fn new(jss: Jss, descriptor: Arc<ResourceDescriptor>, records: Vec<SummaryRecord>) -> Self {
        Self {
            jss,
            descriptor,
            records,
        }
    }

    /// Read a listing response.
    ///
    /// XML listings hold one child per record (plus `size`), optionally
    /// below the descriptor's container tag. JSON listings are an array or
    /// an object with a `results` array.
    pub fn from_document(jss: Jss, descriptor: Arc<ResourceDescriptor>, document: &Document) -> Self {
        let entries = listing_entries(&descriptor, document);
        let records = entries
            .into_iter()
            .filter_map(|entry| {
                let record = SummaryRecord::from_value(&descriptor, entry);
                if record.is_none() {
                    debug!("Skipping {} listing entry without an id", descriptor.name);
                }
                record
            })
            .collect();
        Self::new(jss, descriptor, records)
    }

    /// Resource type name
    pub fn kind(&self) -> &str {
        &self.descriptor.name
    }

    /// Descriptor of the listed type
    pub fn descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the listing was empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&SummaryRecord> {
        self.records.get(index)
    }

    /// Records in order
    pub fn iter(&self) -> impl Iterator<Item = &SummaryRecord> {
        self.records.iter()
    }

    /// Ids in order
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(SummaryRecord::id).collect()
    }

    /// Names in order
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(SummaryRecord::name).collect()
    }

    /// Fetch the full record at `index`
    pub async fn resolve(&self, index: usize) -> Result<Resource> {
        let record = self.records.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.records.len(),
        })?;
        self.resolve_record(record, QueryOptions::new()).await
    }

    /// Fetch the full record with the given id.
    ///
    /// Only this collection is searched; an id that is not a member yields
    /// `Ok(None)` without a request.
    pub async fn resolve_by_id(&self, id: &str) -> Result<Option<Resource>> {
        match self.records.iter().find(|r| r.id() == id) {
            Some(record) => self
                .resolve_record(record, QueryOptions::new())
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Fetch every record, a bounded number at a time, keeping order
    pub async fn resolve_all(&self, options: QueryOptions) -> Result<Vec<Resource>> {
        stream::iter(self.records.iter())
            .map(|record| self.resolve_record(record, options.clone()))
            .buffered(self.jss.resolve_concurrency())
            .try_collect()
            .await
    }

    async fn resolve_record(&self, record: &SummaryRecord, options: QueryOptions) -> Result<Resource> {
        let mut resource = Resource::new(
            self.jss.clone(),
            Arc::clone(&self.descriptor),
            Seed::Summary(record.clone()),
            options,
        )?;
        resource.retrieve().await?;
        Ok(resource)
    }

    /// Sort by numeric id; stable
    pub fn sort_by_id(&mut self) {
        self.records.sort_by(|a, b| compare_ids(a.id(), b.id()));
    }

    /// Sort by name, ignoring case; stable
    pub fn sort_by_name(&mut self) {
        self.records
            .sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
    }
}

impl IntoIterator for SummarySet {
    type Item = SummaryRecord;
    type IntoIter = std::vec::IntoIter<SummaryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl fmt::Display for SummarySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .records
            .iter()
            .map(|r| r.id().len())
            .max()
            .unwrap_or(0)
            .max(2);

        writeln!(f, "{:>width$}  NAME", "ID")?;
        for record in &self.records {
            writeln!(f, "{:>width$}  {}", record.id(), record.name())?;
        }
        Ok(())
    }
}

/// Numeric ids first in numeric order, anything else after in text order
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn listing_entries<'d>(descriptor: &ResourceDescriptor, document: &'d Document) -> Vec<&'d JsonValue> {
    let root = document.root();

    if let JsonValue::Array(items) = root {
        return items.iter().collect();
    }
    if let Some(JsonValue::Array(items)) = root.get("results") {
        return items.iter().collect();
    }

    let container = descriptor
        .container_tag
        .as_deref()
        .and_then(|tag| document.get(tag))
        .unwrap_or(root);

    let JsonValue::Object(children) = container else {
        return Vec::new();
    };

    children
        .iter()
        .filter(|(tag, _)| tag.as_str() != SIZE_TAG)
        .flat_map(|(_, value)| match value {
            JsonValue::Array(items) => items.iter().collect::<Vec<_>>(),
            JsonValue::Object(_) => vec![value],
            _ => Vec::new(),
        })
        .collect()
}
