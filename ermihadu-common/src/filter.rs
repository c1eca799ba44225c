//! Filter and sort of the in-memory item list
//!
//! Pure functions only: the full list and a selection in, a filtered and
//! ordered view out. Nothing here touches the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{Item, Size};
use crate::{Error, Result};

const ALL: &str = "all";

/// Size predicate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeFilter {
    #[default]
    All,
    Only(Size),
}

impl SizeFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            SizeFilter::All => true,
            SizeFilter::Only(size) => item.size == Some(*size),
        }
    }
}

impl fmt::Display for SizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeFilter::All => f.write_str(ALL),
            SizeFilter::Only(size) => write!(f, "{}", size),
        }
    }
}

impl FromStr for SizeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case(ALL) {
            return Ok(SizeFilter::All);
        }
        s.parse().map(SizeFilter::Only)
    }
}

impl TryFrom<String> for SizeFilter {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SizeFilter> for String {
    fn from(filter: SizeFilter) -> Self {
        filter.to_string()
    }
}

/// Person predicate (exact name match)
///
/// The empty string stands for "all people"; no person can have a blank
/// name, so every non-empty value is a real name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonFilter {
    #[default]
    All,
    Only(String),
}

impl PersonFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            PersonFilter::All => true,
            PersonFilter::Only(name) => item.person == *name,
        }
    }
}

impl fmt::Display for PersonFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonFilter::All => Ok(()),
            PersonFilter::Only(name) => f.write_str(name),
        }
    }
}

impl From<String> for PersonFilter {
    fn from(value: String) -> Self {
        let name = value.trim();
        if name.is_empty() {
            PersonFilter::All
        } else {
            PersonFilter::Only(name.to_string())
        }
    }
}

impl From<PersonFilter> for String {
    fn from(filter: PersonFilter) -> Self {
        filter.to_string()
    }
}

/// Sort direction by timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    #[default]
    Newest,
    Oldest,
}

impl Recency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recency::Newest => "newest",
            Recency::Oldest => "oldest",
        }
    }
}

impl FromStr for Recency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Recency::Newest),
            "oldest" => Ok(Recency::Oldest),
            other => Err(Error::InvalidInput(format!("Unknown recency: {}", other))),
        }
    }
}

/// The three list controls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub size: SizeFilter,
    #[serde(default)]
    pub recency: Recency,
    #[serde(default)]
    pub person: PersonFilter,
}

/// Select and order the items to display
///
/// Items with an unparseable timestamp count as older than any dated item.
pub fn apply_filters<'a>(items: &'a [Item], selection: &FilterSelection) -> Vec<&'a Item> {
    let mut visible: Vec<(&Item, _)> = items
        .iter()
        .filter(|item| selection.size.matches(item))
        .filter(|item| selection.person.matches(item))
        .map(|item| (item, item.parsed_timestamp()))
        .collect();

    match selection.recency {
        Recency::Newest => visible.sort_by(|a, b| b.1.cmp(&a.1)),
        Recency::Oldest => visible.sort_by(|a, b| a.1.cmp(&b.1)),
    }

    visible.into_iter().map(|(item, _)| item).collect()
}
