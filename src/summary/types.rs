//! Summary record and query result types

use super::set::SummarySet;
use crate::catalog::ResourceDescriptor;
use crate::error::{Error, Result};
use crate::resource::Resource;
use crate::types::{JsonObject, JsonValue};
use serde_json::json;

/// Identity of one record as returned by a listing: id, name and any other
/// top-level scalar fields
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    id: String,
    name: String,
    fields: JsonObject,
}

impl SummaryRecord {
    /// Create a record from an id and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: JsonObject::new(),
        }
    }

    /// Read one listing entry.
    ///
    /// Nested objects and arrays are dropped. Entries without an id cannot
    /// be resolved and yield `None`.
    pub fn from_value(descriptor: &ResourceDescriptor, value: &JsonValue) -> Option<Self> {
        let JsonValue::Object(entry) = value else {
            return None;
        };

        let fields: JsonObject = entry
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let id = scalar_text(fields.get("id")?)?;
        if id.is_empty() {
            return None;
        }

        let name_key = descriptor
            .primary_name_path()
            .rsplit('/')
            .next()
            .filter(|key| fields.contains_key(*key))
            .unwrap_or("name");
        let name = fields
            .get(name_key)
            .and_then(scalar_text)
            .unwrap_or_default();

        Some(Self { id, name, fields })
    }

    /// Record id; stable for the lifetime of the collection
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name as listed when the collection was fetched
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every scalar field of the listing entry
    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// One scalar field of the listing entry
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    /// `{ "id": ..., "name": ... }` entry used inside other records
    pub fn to_value(&self) -> JsonValue {
        json!({ "id": self.id, "name": self.name })
    }
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Outcome of a query: one full record or a listing
#[derive(Debug)]
pub enum QueryResult {
    /// The response held one complete record
    Record(Box<Resource>),
    /// The response was a listing of summaries
    Records(SummarySet),
}

impl QueryResult {
    /// True for a single record
    pub fn is_record(&self) -> bool {
        matches!(self, QueryResult::Record(_))
    }

    /// The single record; a listing is an error
    pub fn into_record(self) -> Result<Resource> {
        match self {
            QueryResult::Record(resource) => Ok(*resource),
            QueryResult::Records(set) => Err(Error::invalid_argument(format!(
                "query returned a listing of {} {} records, not a single record",
                set.len(),
                set.kind()
            ))),
        }
    }

    /// The listing; a single record is an error
    pub fn into_records(self) -> Result<SummarySet> {
        match self {
            QueryResult::Records(set) => Ok(set),
            QueryResult::Record(resource) => Err(Error::invalid_argument(format!(
                "query returned the single {} record '{}', not a listing",
                resource.kind(),
                resource.name()
            ))),
        }
    }
}
