//! Query argument types

use chrono::NaiveDate;
use std::fmt;

// ============================================================================
// Search Argument
// ============================================================================

/// What to look for when querying a resource type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchArg {
    /// No search: the bare listing (or the singleton record)
    #[default]
    All,
    /// A numeric record id
    Id(u64),
    /// A name, a wildcard pattern, an integer-like string or a
    /// `key=value` search such as `serial_number=C02X1234`
    Text(String),
}

impl SearchArg {
    /// Id carried by this argument, including integer-like text
    pub fn as_id(&self) -> Option<u64> {
        match self {
            SearchArg::Id(id) => Some(*id),
            SearchArg::Text(text) if is_integer_like(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// True for `All` and for empty or whitespace-only text
    pub fn is_listing(&self) -> bool {
        match self {
            SearchArg::All => true,
            SearchArg::Id(_) => false,
            SearchArg::Text(text) => text.trim().is_empty(),
        }
    }
}

/// Non-empty and all ASCII digits
pub fn is_integer_like(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for SearchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchArg::All => f.write_str("<all>"),
            SearchArg::Id(id) => write!(f, "{id}"),
            SearchArg::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for SearchArg {
    fn from(id: u64) -> Self {
        SearchArg::Id(id)
    }
}

impl From<u32> for SearchArg {
    fn from(id: u32) -> Self {
        SearchArg::Id(u64::from(id))
    }
}

impl From<&str> for SearchArg {
    fn from(text: &str) -> Self {
        SearchArg::Text(text.to_string())
    }
}

impl From<String> for SearchArg {
    fn from(text: String) -> Self {
        SearchArg::Text(text)
    }
}

impl From<&String> for SearchArg {
    fn from(text: &String) -> Self {
        SearchArg::Text(text.clone())
    }
}

impl<T: Into<SearchArg>> From<Option<T>> for SearchArg {
    fn from(value: Option<T>) -> Self {
        value.map_or(SearchArg::All, Into::into)
    }
}

// ============================================================================
// Query Options
// ============================================================================

/// Option name for field subsets
pub const SUBSET: &str = "subset";

/// Option name for date ranges
pub const DATE_RANGE: &str = "date_range";

/// Value of one extra query option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `&`-joined list, e.g. subset sections
    List(Vec<String>),
    /// Inclusive date range rendered as `start_end`
    DateRange(NaiveDate, NaiveDate),
    /// Single value rendered as `name/value`
    Text(String),
}

/// Extra options appended to a query path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryOptions {
    entries: Vec<(String, OptionValue)>,
}

impl QueryOptions {
    /// No options
    pub fn new() -> Self {
        Self::default()
    }

    /// Request only the named sections of a record
    #[must_use]
    pub fn subset<I, S>(self, sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sections = sections
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        self.set(SUBSET, OptionValue::List(sections))
    }

    /// Request a subset given as an `&`-delimited string (`general&hardware`)
    #[must_use]
    pub fn subset_str(self, sections: &str) -> Self {
        self.subset(sections.split('&').map(str::trim))
    }

    /// Restrict a usage or history query to a date range
    #[must_use]
    pub fn date_range(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.set(DATE_RANGE, OptionValue::DateRange(start, end))
    }

    /// Any other option, rendered as `name/value`
    #[must_use]
    pub fn with(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, OptionValue::Text(value.into()))
    }

    /// Add or replace an option
    #[must_use]
    pub fn set(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Look up an option by name
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Option names in the order they were supplied
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// True when no options are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when a field subset is requested, so a fetch returns a
    /// partial record
    pub fn is_partial(&self) -> bool {
        matches!(self.get(SUBSET), Some(OptionValue::List(sections)) if !sections.is_empty())
    }
}
