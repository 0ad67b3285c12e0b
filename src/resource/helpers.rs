//! Helpers for specific resource types
//!
//! Edits only touch local data; call `Resource::save` to send them. Readers
//! fetch first when the cache state requires it.

use super::proxy::Resource;
use crate::decode::Document;
use crate::error::{Error, Result};
use crate::http::ApiRequest;
use crate::query::{encode_segment, is_valid_id, resource_path, QueryOptions};
use crate::summary::SummaryRecord;
use crate::types::{Format, JsonValue};
use serde_json::json;

/// Default action when adding a package to a policy
pub const INSTALL: &str = "Install";

// ============================================================================
// Generic Fields and Lists
// ============================================================================

/// Write a boolean in the record's format (`"true"` text for XML)
pub fn set_bool(resource: &mut Resource, path: &str, value: bool) -> Result<()> {
    match resource.descriptor().format() {
        Format::Xml => resource.set(path, value.to_string()),
        Format::Json => resource.set(path, value),
    }
}

/// Add an `{id, name}` entry to the list at `list_path`.
///
/// Entries are stored under `item_tag` (`scope/computers` holds `computer`
/// entries). Returns false when an entry with the same id is already there.
pub fn add_to_list(
    resource: &mut Resource,
    list_path: &str,
    item_tag: &str,
    member: &SummaryRecord,
) -> Result<bool> {
    push_entry(resource, list_path, item_tag, member.id(), member.to_value())
}

/// Remove every entry whose id or name equals `key`; returns whether any was
pub fn remove_from_list(
    resource: &mut Resource,
    list_path: &str,
    item_tag: &str,
    key: &str,
) -> Result<bool> {
    let present = entries(resource.data().get(list_path), item_tag)
        .iter()
        .any(|e| entry_matches(e, key));
    if !present {
        return Ok(false);
    }

    if let Some(JsonValue::Object(map)) = resource.data_mut().get_mut(list_path) {
        match map.get_mut(item_tag) {
            Some(JsonValue::Array(items)) => {
                items.retain(|e| !entry_matches(e, key));
                if items.is_empty() {
                    map.shift_remove(item_tag);
                }
            }
            Some(_) => {
                map.shift_remove(item_tag);
            }
            None => {}
        }
    }
    Ok(true)
}

/// Empty the list at `list_path`
pub fn clear_list(resource: &mut Resource, list_path: &str) -> Result<()> {
    resource.set(list_path, JsonValue::Null)
}

// ============================================================================
// Policy Scope
// ============================================================================

/// Scope list and entry tag for each resource type that can be scoped
const SCOPE_SLOTS: [(&str, &str, &str); 8] = [
    ("Computer", "computers", "computer"),
    ("ComputerGroup", "computer_groups", "computer_group"),
    ("Building", "buildings", "building"),
    ("Department", "departments", "department"),
    ("MobileDevice", "mobile_devices", "mobile_device"),
    ("MobileDeviceGroup", "mobile_device_groups", "mobile_device_group"),
    ("User", "users", "user"),
    ("UserGroup", "user_groups", "user_group"),
];

/// Lists reset by `clear_scope`
const CLEARED_SCOPE_LISTS: [&str; 4] = ["computers", "computer_groups", "buildings", "departments"];

fn scope_slot(kind: &str) -> Result<(&'static str, &'static str)> {
    SCOPE_SLOTS
        .iter()
        .find(|(k, _, _)| *k == kind)
        .map(|(_, list, item)| (*list, *item))
        .ok_or_else(|| Error::invalid_argument(format!("{kind} records cannot be scoped")))
}

fn saved_summary(member: &Resource) -> Result<SummaryRecord> {
    let summary = member.as_summary();
    if !is_valid_id(summary.id()) {
        return Err(Error::invalid_argument(format!(
            "{} '{}' must be saved before it can be referenced",
            member.kind(),
            summary.name()
        )));
    }
    Ok(summary)
}

/// Add a computer, group, building, department or user to the scope
pub fn add_to_scope(target: &mut Resource, member: &Resource) -> Result<bool> {
    let (list, item) = scope_slot(member.kind())?;
    let summary = saved_summary(member)?;
    add_to_list(target, &format!("scope/{list}"), item, &summary)
}

/// Add a computer, group, building, department or user to the exclusions
pub fn add_to_exclusions(target: &mut Resource, member: &Resource) -> Result<bool> {
    let (list, item) = scope_slot(member.kind())?;
    let summary = saved_summary(member)?;
    add_to_list(target, &format!("scope/exclusions/{list}"), item, &summary)
}

/// Remove every target and exclusion and turn off `all_computers`
pub fn clear_scope(target: &mut Resource) -> Result<()> {
    for list in CLEARED_SCOPE_LISTS {
        clear_list(target, &format!("scope/{list}"))?;
        clear_list(target, &format!("scope/exclusions/{list}"))?;
    }
    set_bool(target, "scope/all_computers", false)
}

/// Add a package to a policy's package configuration
pub fn add_package_to_policy(policy: &mut Resource, package: &Resource, action: &str) -> Result<bool> {
    if package.kind() != "Package" {
        return Err(Error::invalid_argument(format!(
            "expected a Package, got a {}",
            package.kind()
        )));
    }
    let summary = saved_summary(package)?;
    let entry = json!({
        "id": summary.id(),
        "name": summary.name(),
        "action": action,
    });
    push_entry(
        policy,
        "package_configuration/packages",
        "package",
        summary.id(),
        entry,
    )
}

// ============================================================================
// Groups
// ============================================================================

/// One smart group criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    /// Inventory field, e.g. `Computer Name`
    pub name: String,
    /// Position; appended after the existing criteria when `None`
    pub priority: Option<usize>,
    /// `and` or `or`
    pub and_or: String,
    /// Comparison, e.g. `like`, `is`
    pub search_type: String,
    /// Value compared against
    pub value: String,
    /// `(` before this criterion
    pub opening_paren: bool,
    /// `)` after this criterion
    pub closing_paren: bool,
}

impl Criterion {
    /// `and` criterion without parentheses
    pub fn new(name: impl Into<String>, search_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: None,
            and_or: "and".to_string(),
            search_type: search_type.into(),
            value: value.into(),
            opening_paren: false,
            closing_paren: false,
        }
    }
}

/// Member list and entry tag of each group type, with the member type
const GROUP_SLOTS: [(&str, &str, &str, &str); 3] = [
    ("ComputerGroup", "Computer", "computers", "computer"),
    ("MobileDeviceGroup", "MobileDevice", "mobile_devices", "mobile_device"),
    ("UserGroup", "User", "users", "user"),
];

fn group_slot(group: &Resource) -> Result<(&'static str, &'static str, &'static str)> {
    GROUP_SLOTS
        .iter()
        .find(|(kind, _, _, _)| *kind == group.kind())
        .map(|(_, member, list, item)| (*member, *list, *item))
        .ok_or_else(|| Error::invalid_argument(format!("{} is not a group", group.kind())))
}

/// Whether the group's membership is computed from criteria
pub async fn is_smart(group: &mut Resource) -> Result<bool> {
    Ok(group.text("is_smart").await?.as_deref() == Some("true"))
}

/// Make the group smart or static
pub fn set_smart(group: &mut Resource, smart: bool) -> Result<()> {
    set_bool(group, "is_smart", smart)
}

/// Append a criterion to a smart group
pub fn add_criterion(group: &mut Resource, criterion: &Criterion) -> Result<()> {
    group_slot(group)?;
    let priority = criterion
        .priority
        .unwrap_or_else(|| entries(group.data().get("criteria"), "criterion").len());

    let entry = json!({
        "name": criterion.name,
        "priority": priority.to_string(),
        "and_or": criterion.and_or,
        "search_type": criterion.search_type,
        "value": criterion.value,
        "opening_paren": criterion.opening_paren.to_string(),
        "closing_paren": criterion.closing_paren.to_string(),
    });
    append_entry(group, "criteria", "criterion", entry)
}

/// Add a device (or user) to a static group
pub fn add_device_to_group(group: &mut Resource, device: &Resource) -> Result<bool> {
    let (member_kind, list, item) = group_slot(group)?;
    if device.kind() != member_kind {
        return Err(Error::invalid_argument(format!(
            "a {} cannot hold a {}",
            group.kind(),
            device.kind()
        )));
    }
    if group.data().text("is_smart").as_deref() == Some("true") {
        return Err(Error::invalid_argument(format!(
            "{} '{}' is smart; its members come from criteria",
            group.kind(),
            group.name()
        )));
    }
    let summary = saved_summary(device)?;
    add_to_list(group, list, item, &summary)
}

/// Whether the group lists the device as a member
pub async fn has_member(group: &mut Resource, device: &Resource) -> Result<bool> {
    let (_, list, item) = group_slot(group)?;
    let id = device.id();
    let members = group.get(list).await?;
    Ok(entries(members, item).iter().any(|e| field_text(e, "id").as_deref() == Some(id.as_str())))
}

// ============================================================================
// Devices
// ============================================================================

/// Hardware serial number of a computer or mobile device
pub async fn serial_number(device: &mut Resource) -> Result<Option<String>> {
    Ok(non_empty(device.text("general/serial_number").await?))
}

/// Hardware UDID of a computer or mobile device
pub async fn udid(device: &mut Resource) -> Result<Option<String>> {
    Ok(non_empty(device.text("general/udid").await?))
}

/// Every MAC address recorded for a computer or mobile device
pub async fn mac_addresses(device: &mut Resource) -> Result<Vec<String>> {
    let paths: &[&str] = match device.kind() {
        "MobileDevice" => &["general/wifi_mac_address", "general/bluetooth_mac_address"],
        _ => &["general/mac_address", "general/alt_mac_address"],
    };

    let mut addresses = Vec::new();
    for path in paths {
        if let Some(address) = non_empty(device.text(path).await?) {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

// ============================================================================
// Packages
// ============================================================================

fn require_kind(resource: &Resource, kind: &str) -> Result<()> {
    if resource.kind() == kind {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "expected a {kind}, got a {}",
            resource.kind()
        )))
    }
}

/// Set the OS versions a package installs on, e.g. `"10.14.x, 10.15.x"`
pub fn set_os_requirements(package: &mut Resource, requirements: &str) -> Result<()> {
    require_kind(package, "Package")?;
    package.set("os_requirements", requirements)
}

/// Assign a package to a category by name; packages store no category id
pub fn set_package_category(package: &mut Resource, category: &str) -> Result<()> {
    require_kind(package, "Package")?;
    package.set("category", category)
}

// ============================================================================
// LDAP Servers
// ============================================================================

async fn ldap_lookup(server: &Resource, segments: &str, root_tag: &str) -> Result<Document> {
    require_kind(server, "LDAPServer")?;
    let id = server.id();
    if !is_valid_id(&id) {
        return Err(Error::not_found(format!(
            "LDAP server '{}' has not been saved",
            server.name()
        )));
    }

    let base = resource_path(server.descriptor(), &id, &QueryOptions::new());
    let format = server.descriptor().format();
    let response = server
        .jss()
        .send(ApiRequest::get(format!("{base}/{segments}"), format))
        .await?;
    Document::parse(format, root_tag, &response.body)
}

/// Users matching `user` in the server's directory (`<ldap_users>`)
pub async fn search_ldap_users(server: &Resource, user: &str) -> Result<Document> {
    ldap_lookup(server, &format!("user/{}", encode_segment(user)), "ldap_users").await
}

/// Groups matching `group` in the server's directory (`<ldap_groups>`)
pub async fn search_ldap_groups(server: &Resource, group: &str) -> Result<Document> {
    ldap_lookup(server, &format!("group/{}", encode_segment(group)), "ldap_groups").await
}

/// Whether the directory lists `user` as a member of `group`.
///
/// An unknown user is not a member.
pub async fn is_user_in_group(server: &Resource, user: &str, group: &str) -> Result<bool> {
    let segments = format!(
        "group/{}/user/{}",
        encode_segment(group),
        encode_segment(user)
    );
    let answer = ldap_lookup(server, &segments, "ldap_users").await?;

    let listed = answer.text("ldap_user/username");
    Ok(listed.as_deref() == Some(user)
        && answer.text("ldap_user/is_member").as_deref() == Some("Yes"))
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

// ============================================================================
// Entry Plumbing
// ============================================================================

fn entries<'a>(container: Option<&'a JsonValue>, item_tag: &str) -> Vec<&'a JsonValue> {
    match container.and_then(|c| c.get(item_tag)) {
        Some(JsonValue::Array(items)) => items.iter().collect(),
        Some(entry @ JsonValue::Object(_)) => vec![entry],
        _ => Vec::new(),
    }
}

fn field_text(entry: &JsonValue, field: &str) -> Option<String> {
    match entry.get(field)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entry_matches(entry: &JsonValue, key: &str) -> bool {
    ["id", "name"]
        .iter()
        .any(|field| field_text(entry, field).as_deref() == Some(key))
}

fn push_entry(
    resource: &mut Resource,
    list_path: &str,
    item_tag: &str,
    id: &str,
    entry: JsonValue,
) -> Result<bool> {
    let exists = entries(resource.data().get(list_path), item_tag)
        .iter()
        .any(|e| field_text(e, "id").as_deref() == Some(id));
    if exists {
        return Ok(false);
    }
    append_entry(resource, list_path, item_tag, entry)?;
    Ok(true)
}

fn append_entry(resource: &mut Resource, list_path: &str, item_tag: &str, entry: JsonValue) -> Result<()> {
    let mut entry = Some(entry);

    if let Some(JsonValue::Object(map)) = resource.data_mut().get_mut(list_path) {
        if let Some(entry) = entry.take() {
            match map.get_mut(item_tag) {
                Some(JsonValue::Array(items)) => items.push(entry),
                Some(existing @ JsonValue::Object(_)) => {
                    let first = existing.take();
                    *existing = JsonValue::Array(vec![first, entry]);
                }
                _ => {
                    map.insert(item_tag.to_string(), entry);
                }
            }
        }
    }

    // Missing or empty list element
    if let Some(entry) = entry {
        let mut list = serde_json::Map::new();
        list.insert(item_tag.to_string(), entry);
        resource.set(list_path, JsonValue::Object(list))?;
    }
    Ok(())
}
