//! Resource descriptor types
//!
//! Static per-resource-type metadata, deserialized from the YAML catalog.

use crate::error::{Error, Result};
use crate::types::{ApiFamily, Format, JsonValue, Method};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder in templates replaced by the new record's name
pub const NAME_PLACEHOLDER: &str = "{name}";

// ============================================================================
// Resource Descriptor
// ============================================================================

/// Immutable description of one resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResourceDescriptor {
    /// Type name, e.g. `Computer`
    pub name: String,
    /// Endpoint path below the family prefix, e.g. `computers`
    pub path: String,
    /// API generation the endpoint belongs to
    #[serde(default)]
    pub family: ApiFamily,
    /// Outermost tag of a full record
    pub root_tag: String,
    /// Child of the listing response that holds the entries
    #[serde(default)]
    pub container_tag: Option<String>,
    /// Path segment preceding an id (`id`, `userid`); empty puts the id
    /// directly after the endpoint path
    #[serde(default = "default_id_segment")]
    pub id_segment: String,
    /// Permitted HTTP verbs
    #[serde(default = "default_operations")]
    pub operations: Vec<Method>,
    /// Whether a bare GET of the endpoint returns a listing
    #[serde(default = "default_true")]
    pub listable: bool,
    /// Search key name to the path segment it expands to
    #[serde(default = "default_search_keys")]
    pub search_keys: BTreeMap<String, String>,
    /// Search key used for a plain string search
    #[serde(default = "default_search")]
    pub default_search: Option<String>,
    /// Extra option names accepted, in the order they are appended
    #[serde(default)]
    pub query_options: Vec<String>,
    /// Location of the identifier within a record
    #[serde(default)]
    pub id_path: Option<String>,
    /// Location of the display name within a record
    #[serde(default)]
    pub name_path: Option<String>,
    /// Skeleton for new records
    #[serde(default)]
    pub template: Option<JsonValue>,
}

fn default_id_segment() -> String {
    "id".to_string()
}

fn default_operations() -> Vec<Method> {
    Method::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_search_keys() -> BTreeMap<String, String> {
    BTreeMap::from([("name".to_string(), "name".to_string())])
}

#[allow(clippy::unnecessary_wraps)]
fn default_search() -> Option<String> {
    Some("name".to_string())
}

impl ResourceDescriptor {
    /// Create a classic descriptor with catalog defaults
    pub fn new(name: impl Into<String>, path: impl Into<String>, root_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            family: ApiFamily::Classic,
            root_tag: root_tag.into(),
            container_tag: None,
            id_segment: default_id_segment(),
            operations: default_operations(),
            listable: true,
            search_keys: default_search_keys(),
            default_search: default_search(),
            query_options: Vec::new(),
            id_path: None,
            name_path: None,
            template: None,
        }
    }

    /// Whether the verb is permitted for this type
    pub fn can(&self, method: Method) -> bool {
        self.operations.contains(&method)
    }

    /// Body format of this type's endpoints
    pub fn format(&self) -> Format {
        self.family.format()
    }

    /// Endpoint path including the family prefix
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.family.prefix(), self.path.trim_matches('/'))
    }

    /// A type with exactly one record and no listing or search
    pub fn is_singleton(&self) -> bool {
        !self.listable && self.search_keys.is_empty() && self.id_segment.is_empty()
    }

    /// Path segment a search key expands to
    pub fn search_segment(&self, key: &str) -> Option<&str> {
        self.search_keys.get(key).map(String::as_str)
    }

    /// Segment used for wildcard searches, if the type has one
    pub fn match_segment(&self) -> Option<&str> {
        self.search_segment("match")
    }

    /// Whether an extra query option is accepted
    pub fn allows_option(&self, name: &str) -> bool {
        self.query_options.iter().any(|o| o == name)
    }

    /// Candidate locations of the identifier, most specific first
    pub fn id_paths(&self) -> Vec<&str> {
        match &self.id_path {
            Some(path) => vec![path.as_str()],
            None => vec!["id", "general/id"],
        }
    }

    /// Candidate locations of the display name, most specific first
    pub fn name_paths(&self) -> Vec<&str> {
        match &self.name_path {
            Some(path) => vec![path.as_str()],
            None => vec!["name", "general/name"],
        }
    }

    /// Where a new record's name is written
    pub fn primary_name_path(&self) -> &str {
        self.name_path.as_deref().unwrap_or("name")
    }

    /// Where a new record's id is written
    pub fn primary_id_path(&self) -> &str {
        self.id_path.as_deref().unwrap_or("id")
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config("Resource name cannot be empty"));
        }

        if self.path.trim_matches('/').is_empty() {
            return Err(Error::config(format!(
                "Resource '{}' path cannot be empty",
                self.name
            )));
        }

        if self.root_tag.is_empty() {
            return Err(Error::config(format!(
                "Resource '{}' root_tag cannot be empty",
                self.name
            )));
        }

        if let Some(default) = &self.default_search {
            if !self.search_keys.contains_key(default) {
                return Err(Error::config(format!(
                    "Resource '{}' default search '{default}' is not one of its search keys",
                    self.name
                )));
            }
        }

        if let Some((key, _)) = self.search_keys.iter().find(|(_, seg)| seg.is_empty()) {
            return Err(Error::config(format!(
                "Resource '{}' search key '{key}' has an empty segment",
                self.name
            )));
        }

        if let Some(template) = &self.template {
            if !template.is_object() {
                return Err(Error::config(format!(
                    "Resource '{}' template must be a mapping",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Catalog File
// ============================================================================

/// Top-level layout of a catalog YAML document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Resource type definitions
    pub resources: Vec<ResourceDescriptor>,
}
