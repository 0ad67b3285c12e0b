//! Resource registry
//!
//! Maps resource type names to their descriptors. The built-in catalog is
//! embedded in the binary and parsed once.

use super::types::{CatalogFile, ResourceDescriptor};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

/// Built-in catalog YAML
pub const BUILTIN_CATALOG: &str = include_str!("resources.yaml");

static BUILTIN: LazyLock<std::result::Result<Registry, String>> =
    LazyLock::new(|| Registry::from_yaml_str(BUILTIN_CATALOG).map_err(|e| e.to_string()));

/// Lookup table of resource descriptors
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: BTreeMap<String, Arc<ResourceDescriptor>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded catalog
    pub fn builtin() -> Result<Self> {
        BUILTIN.clone().map_err(Error::config)
    }

    /// Parse and validate a catalog document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;

        let mut seen = HashSet::new();
        for descriptor in &file.resources {
            descriptor.validate()?;
            if !seen.insert(descriptor.name.to_ascii_lowercase()) {
                return Err(Error::config(format!(
                    "Duplicate resource name '{}'",
                    descriptor.name
                )));
            }
        }

        let mut registry = Self::new();
        for descriptor in file.resources {
            registry.insert(descriptor);
        }
        Ok(registry)
    }

    /// Add or replace a descriptor
    pub fn insert(&mut self, descriptor: ResourceDescriptor) -> Arc<ResourceDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.descriptors
            .insert(descriptor.name.clone(), Arc::clone(&descriptor));
        descriptor
    }

    /// Look up a descriptor by type name (case-insensitive)
    pub fn get(&self, name: &str) -> Result<Arc<ResourceDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(name) {
            return Ok(Arc::clone(descriptor));
        }
        self.descriptors
            .values()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| Error::UnknownResource {
                name: name.to_string(),
            })
    }

    /// Whether a type name is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// All type names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.keys().map(String::as_str).collect()
    }

    /// All descriptors, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDescriptor>> {
        self.descriptors.values()
    }

    /// Number of known types
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when no types are registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
