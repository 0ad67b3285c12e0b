//! Serialized record data with path accessors
//!
//! A `Document` is the exclusively owned body of one record. Paths are
//! `/`-delimited (`general/name`, `scope/computers/computer/0/id`); a numeric
//! segment indexes into an array, and index 0 also addresses a lone element
//! that the XML reader did not wrap in an array.

use super::xml;
use crate::error::{Error, Result};
use crate::types::{Format, JsonObject, JsonValue};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Structured document holding every field of one record
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    format: Format,
    root_tag: String,
    root: JsonValue,
}

impl Document {
    /// Create an empty document
    pub fn new(format: Format, root_tag: impl Into<String>) -> Self {
        Self {
            format,
            root_tag: root_tag.into(),
            root: JsonValue::Object(JsonObject::new()),
        }
    }

    /// Wrap an existing value tree
    pub fn from_value(format: Format, root_tag: impl Into<String>, root: JsonValue) -> Self {
        Self {
            format,
            root_tag: root_tag.into(),
            root,
        }
    }

    /// Parse a response body.
    ///
    /// For XML the document's own root tag wins over `root_tag`.
    pub fn parse(format: Format, root_tag: &str, body: &str) -> Result<Self> {
        match format {
            Format::Xml => {
                let (tag, root) = xml::parse(body)?;
                Ok(Self::from_value(format, tag, root))
            }
            Format::Json => {
                let root: JsonValue = serde_json::from_str(body)
                    .map_err(|e| Error::malformed(format!("invalid JSON body: {e}")))?;
                Ok(Self::from_value(format, root_tag, root))
            }
        }
    }

    /// Body format
    pub fn format(&self) -> Format {
        self.format
    }

    /// Tag of the outermost element
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// Whole value tree
    pub fn root(&self) -> &JsonValue {
        &self.root
    }

    /// Consume the document, returning its value tree
    pub fn into_value(self) -> JsonValue {
        self.root
    }

    /// True when the document holds no fields at all
    pub fn is_empty(&self) -> bool {
        match &self.root {
            JsonValue::Null => true,
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Names of the top-level fields, in document order
    pub fn top_level_keys(&self) -> Vec<String> {
        match &self.root {
            JsonValue::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Look up the value at `path`
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut current = &self.root;
        for segment in segments(path) {
            current = step(current, segment)?;
        }
        Some(current)
    }

    /// Mutable access to the value at `path`
    pub fn get_mut(&mut self, path: &str) -> Option<&mut JsonValue> {
        let mut current = &mut self.root;
        for segment in segments(path) {
            current = step_existing_mut(current, segment)?;
        }
        Some(current)
    }

    /// Scalar value at `path` rendered as text.
    ///
    /// Empty elements read as `""`; objects and arrays have no text.
    pub fn text(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            JsonValue::Bool(b) => Some(b.to_string()),
            JsonValue::Null => Some(String::new()),
            JsonValue::Object(_) | JsonValue::Array(_) => None,
        }
    }

    /// True when `path` resolves to any value, including an empty element
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at `path`, creating intermediate objects as needed
    pub fn set(&mut self, path: &str, value: impl Into<JsonValue>) -> Result<()> {
        let parts: Vec<&str> = segments(path).collect();
        let Some((last, parents)) = parts.split_last() else {
            self.root = value.into();
            return Ok(());
        };

        let mut current = &mut self.root;
        for segment in parents {
            current = step_mut(current, segment, path)?;
        }

        match current {
            JsonValue::Array(items) => {
                let index = parse_index(last, path)?;
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index] = value.into(),
                    std::cmp::Ordering::Equal => items.push(value.into()),
                    std::cmp::Ordering::Greater => {
                        return Err(Error::IndexOutOfRange {
                            index,
                            len: items.len(),
                        })
                    }
                }
            }
            JsonValue::Object(map) => {
                map.insert((*last).to_string(), value.into());
            }
            other => {
                // Empty elements and scalars are replaced by a fresh container
                let mut map = JsonObject::new();
                map.insert((*last).to_string(), value.into());
                *other = JsonValue::Object(map);
            }
        }
        Ok(())
    }

    /// Remove and return the value at `path`
    pub fn remove(&mut self, path: &str) -> Option<JsonValue> {
        let parts: Vec<&str> = segments(path).collect();
        let (last, parents) = parts.split_last()?;

        let mut current = &mut self.root;
        for segment in parents {
            current = step_existing_mut(current, segment)?;
        }

        match current {
            JsonValue::Object(map) => map.shift_remove(*last),
            JsonValue::Array(items) => {
                let index: usize = last.parse().ok()?;
                (index < items.len()).then(|| items.remove(index))
            }
            _ => None,
        }
    }

    /// Serialize to the wire format.
    ///
    /// Output is deterministic, so two documents with the same fields in the
    /// same order serialize to identical bytes.
    pub fn serialize(&self) -> String {
        match self.format {
            Format::Xml => xml::write(&self.root_tag, &self.root),
            Format::Json => self.root.to_string(),
        }
    }

    /// Hash of the serialized form
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.serialize().hash(&mut hasher);
        hasher.finish()
    }
}

// ============================================================================
// Path Helpers
// ============================================================================

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_index(segment: &str, path: &str) -> Result<usize> {
    segment
        .parse()
        .map_err(|_| Error::invalid_path(path, format!("'{segment}' is not an array index")))
}

fn step<'v>(current: &'v JsonValue, segment: &str) -> Option<&'v JsonValue> {
    match current {
        JsonValue::Object(map) => map
            .get(segment)
            .or_else(|| (segment == "0").then_some(current)),
        JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ if segment == "0" => Some(current),
        _ => None,
    }
}

fn step_existing_mut<'v>(current: &'v mut JsonValue, segment: &str) -> Option<&'v mut JsonValue> {
    let descend = match &*current {
        JsonValue::Object(map) => map.contains_key(segment),
        JsonValue::Array(_) => true,
        _ => false,
    };
    if !descend {
        return (segment == "0").then_some(current);
    }
    match current {
        JsonValue::Object(map) => map.get_mut(segment),
        JsonValue::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn step_mut<'v>(current: &'v mut JsonValue, segment: &str, path: &str) -> Result<&'v mut JsonValue> {
    let lone_element = segment == "0"
        && matches!(&*current, JsonValue::Object(map) if !map.contains_key(segment));
    if lone_element {
        return Ok(current);
    }

    if let JsonValue::Array(items) = current {
        let index = parse_index(segment, path)?;
        let len = items.len();
        return items
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len });
    }

    if !current.is_object() {
        *current = JsonValue::Object(JsonObject::new());
    }
    match current {
        JsonValue::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert(JsonValue::Null)),
        _ => Err(Error::invalid_path(path, "cannot descend into value")),
    }
}
