//! Label selectors matching jobs to instances.
//!
//! Instances offer a set of labels and jobs require one. Matching is
//! conjunctive: an instance can take a job when it offers every label the
//! job requires. Labels are opaque tokens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Labels as written in a document: a separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLabels {
    /// Tokens separated by commas and/or whitespace, e.g. `"web, us-west"`.
    Inline(String),
    /// One token per list item.
    List(Vec<String>),
}

impl Default for RawLabels {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl RawLabels {
    /// Returns true when no label is written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parse().is_empty()
    }

    /// Parses the raw form into a comparable label set.
    #[must_use]
    pub fn parse(&self) -> LabelSet {
        let tokens: Box<dyn Iterator<Item = &str> + '_> = match self {
            Self::Inline(raw) => Box::new(raw.split(|c: char| c == ',' || c.is_whitespace())),
            Self::List(items) => Box::new(items.iter().map(String::as_str)),
        };
        tokens
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// An unordered collection of label tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true when the set holds no label.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when `label` is part of the set.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// Iterates labels in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for LabelSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for LabelSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

/// Returns true when `offered` holds every label of `required`.
///
/// An empty requirement is satisfied by any label set.
#[must_use]
pub fn satisfies(required: &LabelSet, offered: &LabelSet) -> bool {
    required.0.is_subset(&offered.0)
}
