//! The resource proxy

use crate::cache::{CachePolicy, CacheState, CacheTracker};
use crate::catalog::{ResourceDescriptor, NAME_PLACEHOLDER};
use crate::decode::Document;
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::jss::Jss;
use crate::query::{self, QueryOptions};
use crate::summary::SummaryRecord;
use crate::types::{Format, JsonObject, JsonValue, Method};
use chrono::Utc;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

/// Id of a record that does not exist on the server yet
pub const UNSAVED_ID: &str = "0";

/// Value the server puts in `category` when none is assigned; it rejects
/// the same value on update
const NO_CATEGORY: &str = "No category assigned";

const CATEGORY_PATHS: [&str; 4] = [
    "category",
    "category/name",
    "general/category",
    "general/category/name",
];

static CREATED_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<id>([0-9]+)</id>").ok());

/// What a proxy is built from
#[derive(Debug, Clone)]
pub enum Seed {
    /// A full record payload
    Payload(Document),
    /// A new record filled from the type's template
    Name {
        /// Name of the new record
        name: String,
        /// Template fields to override
        fields: JsonObject,
    },
    /// A listing entry; data is fetched on first use
    Summary(SummaryRecord),
}

/// Local handle on one remote (or not yet created) record.
///
/// Field reads go through [`Resource::get`] and [`Resource::text`], which
/// fetch first when the cache state requires it. Edits through
/// [`Resource::set`] stay local until [`Resource::save`].
#[derive(Debug, Clone)]
pub struct Resource {
    jss: Jss,
    descriptor: Arc<ResourceDescriptor>,
    data: Document,
    cache: CacheTracker,
    options: QueryOptions,
    identity: Option<SummaryRecord>,
}

impl Resource {
    /// Build a proxy.
    ///
    /// - a payload with an id is current as of now (partial when `options`
    ///   request a subset); without an id it is unsaved
    /// - a name builds an unsaved skeleton from the type's template
    /// - a summary is stale until its first fetch
    pub fn new(
        jss: Jss,
        descriptor: Arc<ResourceDescriptor>,
        seed: Seed,
        options: QueryOptions,
    ) -> Result<Self> {
        let mut resource = Self {
            jss,
            descriptor,
            data: Document::new(Format::default(), ""),
            cache: CacheTracker::unsaved(),
            options,
            identity: None,
        };

        match seed {
            Seed::Payload(document) => {
                if !document.root().is_object() {
                    return Err(Error::invalid_argument(format!(
                        "{} payload must be a record, not a bare value",
                        resource.descriptor.name
                    )));
                }
                if document.format() == Format::Xml
                    && document.root_tag() != resource.descriptor.root_tag
                {
                    return Err(Error::invalid_argument(format!(
                        "<{}> is not a {} record (expected <{}>)",
                        document.root_tag(),
                        resource.descriptor.name,
                        resource.descriptor.root_tag
                    )));
                }
                resource.data = document;
                if resource.descriptor.is_singleton() || resource.stored_id().is_some() {
                    let partial = resource.applied_subset();
                    resource.cache = CacheTracker::fetched(Utc::now(), partial);
                }
            }
            Seed::Name { name, fields } => {
                if name.trim().is_empty() {
                    return Err(Error::invalid_argument(format!(
                        "a new {} needs a non-empty name",
                        resource.descriptor.name
                    )));
                }
                resource.data = skeleton(&resource.descriptor, &name, fields)?;
            }
            Seed::Summary(record) => {
                if !query::is_valid_id(record.id()) {
                    return Err(Error::invalid_argument(format!(
                        "summary id '{}' cannot address a {}",
                        record.id(),
                        resource.descriptor.name
                    )));
                }
                resource.data = Document::new(
                    resource.descriptor.format(),
                    resource.descriptor.root_tag.clone(),
                );
                resource.cache = CacheTracker::unfetched();
                resource.identity = Some(record);
            }
        }

        Ok(resource)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Resource type name
    pub fn kind(&self) -> &str {
        &self.descriptor.name
    }

    /// Descriptor of this record's type
    pub fn descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    /// Server binding this proxy fetches and saves through
    pub fn jss(&self) -> &Jss {
        &self.jss
    }

    /// Best known id without fetching; `"0"` until the record exists
    pub fn id(&self) -> String {
        self.stored_id()
            .or_else(|| self.identity.as_ref().map(|r| r.id().to_string()))
            .unwrap_or_else(|| UNSAVED_ID.to_string())
    }

    /// Best known name without fetching
    pub fn name(&self) -> String {
        self.descriptor
            .name_paths()
            .into_iter()
            .filter_map(|path| self.data.text(path))
            .find(|name| !name.is_empty())
            .or_else(|| self.identity.as_ref().map(|r| r.name().to_string()))
            .unwrap_or_default()
    }

    fn stored_id(&self) -> Option<String> {
        self.descriptor
            .id_paths()
            .into_iter()
            .filter_map(|path| self.data.text(path))
            .find(|id| !id.is_empty() && id != UNSAVED_ID)
    }

    /// Relationship of the local data to the server, evaluated now
    pub fn cache_state(&self) -> CacheState {
        self.cache.state(&self.policy(), Utc::now())
    }

    /// Whether there are local edits not yet saved
    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    fn policy(&self) -> CachePolicy {
        self.jss.cache_policy()
    }

    // ========================================================================
    // Field Access
    // ========================================================================

    /// Local data, without fetching
    pub fn data(&self) -> &Document {
        &self.data
    }

    /// Mutable local data; counts as an unsaved edit
    pub fn data_mut(&mut self) -> &mut Document {
        self.cache.mark_dirty();
        &mut self.data
    }

    /// Consume the proxy, returning its data
    pub fn into_document(self) -> Document {
        self.data
    }

    /// Read a field, fetching first when the local data is not usable
    pub async fn get(&mut self, path: &str) -> Result<Option<&JsonValue>> {
        self.materialize(path).await?;
        Ok(self.data.get(path))
    }

    /// Read a scalar field as text, fetching first when needed
    pub async fn text(&mut self, path: &str) -> Result<Option<String>> {
        self.materialize(path).await?;
        Ok(self.data.text(path))
    }

    /// Write a field locally
    pub fn set(&mut self, path: &str, value: impl Into<JsonValue>) -> Result<()> {
        self.data.set(path, value)?;
        self.cache.mark_dirty();
        Ok(())
    }

    /// Remove a field locally
    pub fn remove(&mut self, path: &str) -> Option<JsonValue> {
        let removed = self.data.remove(path);
        if removed.is_some() {
            self.cache.mark_dirty();
        }
        removed
    }

    /// Fetch if reading `path` needs current data.
    ///
    /// A partial record missing the field's top-level section is refetched
    /// in full, dropping the subset. Edits made before the first fetch are
    /// laid over the fetched data.
    async fn materialize(&mut self, path: &str) -> Result<()> {
        let section = path.split('/').find(|s| !s.is_empty()).unwrap_or_default();
        let present = if self.cache.is_unfetched() {
            self.data.contains(path)
        } else {
            self.data.contains(section)
        };
        let now = Utc::now();

        if !self.cache.must_fetch(&self.policy(), now, present) {
            return Ok(());
        }
        if self.cache.is_dirty() {
            return self.retrieve_under_edits().await;
        }

        if self.cache.state(&self.policy(), now).is_partial() {
            debug!(
                "{} {}: '{section}' is outside the fetched subset",
                self.kind(),
                self.id()
            );
            self.clear_query_options();
        }
        self.retrieve().await
    }

    // ========================================================================
    // Query Options
    // ========================================================================

    /// Options replayed on every fetch
    pub fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    /// Replace the options replayed on fetches
    pub fn set_query_options(&mut self, options: QueryOptions) {
        self.options = options;
    }

    /// Fetch complete records from now on
    pub fn clear_query_options(&mut self) {
        self.options = QueryOptions::new();
    }

    fn applied_subset(&self) -> bool {
        self.options.is_partial() && query::accepts(&self.descriptor, &self.options)
    }

    // ========================================================================
    // Server Operations
    // ========================================================================

    /// Request path of this record with the current options
    pub fn path(&self) -> String {
        query::resource_path(&self.descriptor, &self.id(), &self.options)
    }

    /// Absolute URL of this record
    pub fn url(&self) -> String {
        self.jss.url_for(&self.path())
    }

    /// Force the next field read to fetch
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Fetch the record, replacing all local data and edits
    pub async fn retrieve(&mut self) -> Result<()> {
        self.require(Method::GET)?;

        if !self.descriptor.is_singleton() && !query::is_valid_id(&self.id()) {
            return Err(Error::not_found(format!(
                "{} '{}' has not been saved",
                self.kind(),
                self.name()
            )));
        }

        let path = self.path();
        let document = self.jss.fetch(&self.descriptor, &path).await?;
        self.data = document;
        self.cache.mark_fetched(Utc::now(), self.applied_subset());
        Ok(())
    }

    /// Fetch the record and reapply the local edits on top of it
    async fn retrieve_under_edits(&mut self) -> Result<()> {
        let empty = Document::new(self.descriptor.format(), self.descriptor.root_tag.clone());
        let edits = std::mem::replace(&mut self.data, empty);
        if let Err(e) = self.retrieve().await {
            self.data = edits;
            return Err(e);
        }

        debug!("{} {}: reapplying local edits", self.kind(), self.id());
        let mut root = self.data.root().clone();
        overlay(&mut root, edits.into_value());
        self.data = Document::from_value(
            self.descriptor.format(),
            self.descriptor.root_tag.clone(),
            root,
        );
        self.cache.mark_dirty();
        Ok(())
    }

    /// Create or update the record on the server, then fetch it back.
    ///
    /// Unsaved records are created with POST; the rest are updated with PUT.
    pub async fn save(&mut self) -> Result<()> {
        let creating = !self.cache.is_remote();
        self.require(if creating { Method::POST } else { Method::PUT })?;

        // Edits made before the first fetch would otherwise replace the record
        if self.cache.is_unfetched() && self.cache.is_dirty() {
            self.retrieve_under_edits().await?;
        }

        normalize_category(&mut self.data)?;
        let format = self.descriptor.format();
        let body = self.data.serialize();

        if creating {
            let path = query::post_path(&self.descriptor);
            let response = self.jss.send(ApiRequest::post(path, format, body)).await?;
            let id = created_id(format, &response.body)?;
            info!("Created {} '{}' with id {id}", self.kind(), self.name());
            self.data.set(self.descriptor.primary_id_path(), id)?;
            self.cache = CacheTracker::stale();
        } else {
            let id = self.id();
            let path = query::resource_path(&self.descriptor, &id, &QueryOptions::new());
            self.jss.send(ApiRequest::put(path, format, body)).await?;
            info!("Updated {} '{}' ({id})", self.kind(), self.name());
        }

        self.retrieve().await
    }

    /// Delete the record on the server; the proxy becomes unsaved
    pub async fn delete(&mut self) -> Result<()> {
        self.require(Method::DELETE)?;

        let id = self.id();
        if !self.cache.is_remote() || !query::is_valid_id(&id) {
            return Err(Error::not_found(format!(
                "{} '{}' has not been saved",
                self.kind(),
                self.name()
            )));
        }

        let path = query::resource_path(&self.descriptor, &id, &QueryOptions::new());
        self.jss
            .send(ApiRequest::delete(path, self.descriptor.format()))
            .await?;
        info!("Deleted {} '{}' ({id})", self.kind(), self.name());
        for path in self.descriptor.id_paths() {
            if self.data.contains(path) {
                self.data.set(path, UNSAVED_ID)?;
            }
        }
        self.identity = None;
        self.cache.mark_unsaved();
        Ok(())
    }

    fn require(&self, method: Method) -> Result<()> {
        if self.descriptor.can(method) {
            Ok(())
        } else {
            Err(Error::not_permitted(&self.descriptor.name, method))
        }
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Whether two proxies hold the same record.
    ///
    /// Both sides are fetched first, so this costs two requests and drops
    /// unsaved edits on both. Proxies of different types are never equal,
    /// and an unsaved proxy equals nothing; neither case sends a request.
    pub async fn same_record(&mut self, other: &mut Resource) -> Result<bool> {
        if self.descriptor.name != other.descriptor.name {
            return Ok(false);
        }
        if !self.cache.is_remote() || !other.cache.is_remote() {
            return Ok(false);
        }
        self.retrieve().await?;
        other.retrieve().await?;
        Ok(self.data.serialize() == other.data.serialize())
    }

    /// Hash of the type and the local serialized data
    pub fn content_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.descriptor.name.hash(&mut hasher);
        self.data.content_hash().hash(&mut hasher);
        hasher.finish()
    }

    /// Id and name as a listing entry
    pub fn as_summary(&self) -> SummaryRecord {
        SummaryRecord::new(self.id(), self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data.serialize())
    }
}

// ============================================================================
// Construction Helpers
// ============================================================================

/// Fill the type's template for a new record
fn skeleton(descriptor: &ResourceDescriptor, name: &str, fields: JsonObject) -> Result<Document> {
    let mut root = descriptor
        .template
        .clone()
        .unwrap_or_else(|| JsonValue::Object(JsonObject::new()));
    fill_placeholder(&mut root, name);

    let format = descriptor.format();
    for (key, value) in fields {
        let value = match format {
            Format::Xml => stringify(value),
            Format::Json => value,
        };
        if !override_field(&mut root, &key, &value) {
            warn!(
                "{} template has no field '{key}'; ignoring it",
                descriptor.name
            );
        }
    }

    let mut document = Document::from_value(format, descriptor.root_tag.clone(), root);
    let name_path = descriptor.primary_name_path();
    if !document.text(name_path).is_some_and(|n| !n.is_empty()) {
        document.set(name_path, name)?;
    }
    Ok(document)
}

/// Lay `edits` over `base`, merging objects key by key
fn overlay(base: &mut JsonValue, edits: JsonValue) {
    match (base, edits) {
        (JsonValue::Object(base), JsonValue::Object(edits)) => {
            for (key, value) in edits {
                match base.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, edits) => *base = edits,
    }
}

fn fill_placeholder(value: &mut JsonValue, name: &str) {
    match value {
        JsonValue::String(s) if s == NAME_PLACEHOLDER => *s = name.to_string(),
        JsonValue::Object(map) => map.values_mut().for_each(|v| fill_placeholder(v, name)),
        JsonValue::Array(items) => items.iter_mut().for_each(|v| fill_placeholder(v, name)),
        _ => {}
    }
}

/// Set every template field named `key`; returns whether any matched
fn override_field(value: &mut JsonValue, key: &str, replacement: &JsonValue) -> bool {
    let JsonValue::Object(map) = value else {
        return false;
    };

    let mut matched = false;
    for (field, child) in map.iter_mut() {
        if field == key {
            *child = replacement.clone();
            matched = true;
        } else {
            matched |= override_field(child, key, replacement);
        }
    }
    matched
}

/// XML bodies hold text only
fn stringify(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => JsonValue::String(n.to_string()),
        JsonValue::Bool(b) => JsonValue::String(b.to_string()),
        JsonValue::Object(map) => {
            JsonValue::Object(map.into_iter().map(|(k, v)| (k, stringify(v))).collect())
        }
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(stringify).collect()),
        other => other,
    }
}

// ============================================================================
// Save Helpers
// ============================================================================

fn normalize_category(data: &mut Document) -> Result<()> {
    for path in CATEGORY_PATHS {
        if data.text(path).as_deref() == Some(NO_CATEGORY) {
            debug!("Clearing placeholder category at {path}");
            data.set(path, "")?;
        }
    }
    Ok(())
}

/// Id the server assigned in a create response
fn created_id(format: Format, body: &str) -> Result<String> {
    let id = match format {
        Format::Xml => CREATED_ID
            .as_ref()
            .and_then(|re| re.captures(body))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        Format::Json => serde_json::from_str::<JsonValue>(body)
            .ok()
            .and_then(|v| match v.get("id") {
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(JsonValue::Number(n)) => Some(n.to_string()),
                _ => None,
            }),
    };

    id.filter(|id| query::is_valid_id(id))
        .ok_or_else(|| Error::malformed(format!("create response carries no id: {body}")))
}
