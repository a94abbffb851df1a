//! Rewrite rule table - ordered (pattern, query) pairs.
//!
//! Order is load-bearing: at routing time the first pattern that matches
//! wins, so every producer in this crate keeps tables in precedence order.
//! At build time merging follows overwrite-in-place semantics: inserting a
//! pattern that already exists replaces its query but keeps the position of
//! the first occurrence.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single rewrite rule: URL regex -> query-string template.
///
/// The pattern is an anchored-at-start regex over the request path (no
/// leading slash); the query template addresses captures with
/// back-references (`$2` or `$matches[2]` depending on engine style).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pub pattern: String,
    pub query: String,
}

/// Indexed back-reference style used in query templates.
///
/// `Indexed` emits `$1`, `$2`, ... (server-config friendly); `Matches`
/// emits `$matches[1]`, ... for tables consumed by the request router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackrefStyle {
    Indexed,
    #[default]
    Matches,
}

impl BackrefStyle {
    /// Render the back-reference placeholder for capture group `n` (1-based).
    pub fn backref(self, n: usize) -> String {
        match self {
            Self::Indexed => format!("${n}"),
            Self::Matches => format!("$matches[{n}]"),
        }
    }
}

/// Ordered rewrite rule table.
///
/// Serializes as a JSON object (pattern -> query) with order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<RewriteRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert a rule. If the pattern already exists its query is replaced
    /// in place (position of the first occurrence is kept).
    pub fn insert(&mut self, pattern: impl Into<String>, query: impl Into<String>) {
        let pattern = pattern.into();
        let query = query.into();
        match self.rules.iter_mut().find(|r| r.pattern == pattern) {
            Some(existing) => existing.query = query,
            None => self.rules.push(RewriteRule { pattern, query }),
        }
    }

    /// Append every rule of `other`, overwriting duplicates in place.
    pub fn extend(&mut self, other: RuleTable) {
        for rule in other.rules {
            self.insert(rule.pattern, rule.query);
        }
    }

    /// `self` followed by `other`, duplicate patterns overwritten in place
    /// by the later table.
    pub fn merged_with(mut self, other: RuleTable) -> RuleTable {
        self.extend(other);
        self
    }

    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.pattern == pattern)
            .map(|r| r.query.as_str())
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.get(pattern).is_some()
    }

    /// Position of a pattern in the table, if present.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.pattern == pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter()
    }
}

impl IntoIterator for RuleTable {
    type Item = RewriteRule;
    type IntoIter = std::vec::IntoIter<RewriteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a RewriteRule;
    type IntoIter = std::slice::Iter<'a, RewriteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<(String, String)> for RuleTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut table = RuleTable::new();
        for (pattern, query) in iter {
            table.insert(pattern, query);
        }
        table
    }
}

impl Serialize for RuleTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.pattern, &rule.query)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = RuleTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of rewrite patterns to query templates")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = RuleTable::new();
                while let Some((pattern, query)) = access.next_entry::<String, String>()? {
                    table.insert(pattern, query);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}
