//! Path construction
//!
//! Pure functions from a descriptor, a search argument and extra options
//! to a request path relative to the server URL. No I/O happens here.

use super::types::{is_integer_like, OptionValue, QueryOptions, SearchArg, SUBSET};
use crate::catalog::ResourceDescriptor;
use crate::error::{Error, Result};
use tracing::warn;

/// Marker that routes a plain search through the match segment
pub const WILDCARD: char = '*';

/// Subset sections that already carry the record identifier
const IDENTITY_SECTIONS: [&str; 2] = ["general", "basic"];

/// Build the path for a query.
///
/// - `All` (or empty text) is the bare listing
/// - an id, or integer-like text, goes through the id segment
/// - `key=value` goes through the key's mapped segment
/// - text containing `*` goes through the match segment when there is one
/// - any other text goes through the default search key
pub fn build_path(
    descriptor: &ResourceDescriptor,
    search: &SearchArg,
    options: &QueryOptions,
) -> Result<String> {
    let mut path = descriptor.endpoint();

    if descriptor.is_singleton() {
        if !search.is_listing() {
            return Err(Error::invalid_argument(format!(
                "{} has a single record and cannot be searched",
                descriptor.name
            )));
        }
        push_options(&mut path, descriptor, options);
        return Ok(path);
    }

    if search.is_listing() {
        if !descriptor.listable {
            return Err(Error::invalid_argument(format!(
                "{} cannot be listed; supply a search",
                descriptor.name
            )));
        }
        push_options(&mut path, descriptor, options);
        return Ok(path);
    }

    if let Some(id) = search.as_id() {
        push_id(&mut path, descriptor, &id.to_string());
        push_options(&mut path, descriptor, options);
        return Ok(path);
    }

    let SearchArg::Text(text) = search else {
        return Err(Error::invalid_argument(format!("unsupported search '{search}'")));
    };

    let (segment, value) = search_segment(descriptor, text)?;
    path.push('/');
    path.push_str(segment);
    path.push('/');
    path.push_str(&encode_segment(value));
    push_options(&mut path, descriptor, options);
    Ok(path)
}

/// Path of one record by id, with options replayed
pub fn resource_path(descriptor: &ResourceDescriptor, id: &str, options: &QueryOptions) -> String {
    let mut path = descriptor.endpoint();
    if !descriptor.is_singleton() {
        push_id(&mut path, descriptor, id);
    }
    push_options(&mut path, descriptor, options);
    path
}

/// Path a new record is created at.
///
/// Classic endpoints create through the `0` id; pro endpoints through the
/// collection itself.
pub fn post_path(descriptor: &ResourceDescriptor) -> String {
    let mut path = descriptor.endpoint();
    if !descriptor.id_segment.is_empty() {
        push_id(&mut path, descriptor, "0");
    }
    path
}

/// Whether every supplied option is accepted by the descriptor.
///
/// Options are applied all-or-nothing: one unknown name drops them all.
pub fn accepts(descriptor: &ResourceDescriptor, options: &QueryOptions) -> bool {
    options.names().all(|name| descriptor.allows_option(name))
}

/// Path segments the options expand to, in the descriptor's order
pub fn option_segments(descriptor: &ResourceDescriptor, options: &QueryOptions) -> Vec<String> {
    if options.is_empty() {
        return Vec::new();
    }

    if !accepts(descriptor, options) {
        let rejected: Vec<&str> = options
            .names()
            .filter(|name| !descriptor.allows_option(name))
            .collect();
        warn!(
            "{} does not accept options {:?}; sending query without options",
            descriptor.name, rejected
        );
        return Vec::new();
    }

    descriptor
        .query_options
        .iter()
        .filter_map(|name| options.get(name).map(|value| render_option(name, value)))
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn push_id(path: &mut String, descriptor: &ResourceDescriptor, id: &str) {
    if !descriptor.id_segment.is_empty() {
        path.push('/');
        path.push_str(&descriptor.id_segment);
    }
    path.push('/');
    path.push_str(&encode_segment(id));
}

fn push_options(path: &mut String, descriptor: &ResourceDescriptor, options: &QueryOptions) {
    for segment in option_segments(descriptor, options) {
        path.push('/');
        path.push_str(&segment);
    }
}

/// Pick the segment and raw value for a text search
fn search_segment<'a>(
    descriptor: &'a ResourceDescriptor,
    text: &'a str,
) -> Result<(&'a str, &'a str)> {
    if let Some((key, value)) = text.split_once('=') {
        let key = key.trim();
        return descriptor
            .search_segment(key)
            .map(|segment| (segment, value))
            .ok_or_else(|| Error::UnsupportedSearchKey {
                resource: descriptor.name.clone(),
                key: key.to_string(),
            });
    }

    if text.contains(WILDCARD) {
        if let Some(segment) = descriptor.match_segment() {
            return Ok((segment, text));
        }
    }

    let default = descriptor.default_search.as_deref().unwrap_or("name");
    descriptor
        .search_segment(default)
        .map(|segment| (segment, text))
        .ok_or_else(|| Error::UnsupportedSearchKey {
            resource: descriptor.name.clone(),
            key: default.to_string(),
        })
}

fn render_option(name: &str, value: &OptionValue) -> String {
    match value {
        OptionValue::List(items) if name == SUBSET => {
            if items.is_empty() {
                return String::new();
            }
            let mut sections = items.clone();
            let has_identity = sections
                .iter()
                .any(|s| IDENTITY_SECTIONS.iter().any(|i| s.eq_ignore_ascii_case(i)));
            if !has_identity {
                sections.push("general".to_string());
            }
            let joined: Vec<String> = sections.iter().map(|s| encode_segment(s)).collect();
            format!("{SUBSET}/{}", joined.join("&"))
        }
        OptionValue::List(items) => {
            if items.is_empty() {
                return String::new();
            }
            let joined: Vec<String> = items.iter().map(|s| encode_segment(s)).collect();
            format!("{name}/{}", joined.join("&"))
        }
        OptionValue::DateRange(start, end) => {
            format!("{}_{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
        }
        OptionValue::Text(text) => format!("{name}/{}", encode_segment(text)),
    }
}

/// Percent-encode one path segment, leaving the wildcard literal
pub fn encode_segment(value: &str) -> String {
    urlencoding::encode(value).replace("%2A", "*")
}

/// Whether a string is usable as a record id
pub fn is_valid_id(id: &str) -> bool {
    is_integer_like(id) && id != "0"
}
