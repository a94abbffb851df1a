//! Storage seams: the options cache and the content store.
//!
//! The engine treats persistence as an external collaborator. Options are
//! an ordered key/value map holding the compiled rule table under a
//! well-known key; content is an opaque queryable set of addressable
//! items. Both are traits so tests run fully in memory while the CLI uses
//! JSON files.

mod file;
mod memory;

pub use file::FileOptionStore;
pub use memory::{ContentFixture, ContentItem, ContentType, MemoryContentStore};
#[cfg(test)]
pub use memory::MemoryOptionStore;

use anyhow::Result;
use serde_json::Value;

use crate::engine::RuleTable;

/// Well-known options key for the compiled rule table.
pub const REWRITE_RULES_KEY: &str = "rewrite_rules";

/// Ordered key/value persistence for engine options.
///
/// Writes are last-write-wins: the rule table is a pure function of the
/// configuration, so racing rebuilds converge on the same value.
pub trait OptionStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Read the cached rule table, if one is persisted.
pub fn load_rules(store: &dyn OptionStore) -> Result<Option<RuleTable>> {
    match store.get(REWRITE_RULES_KEY) {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Persist the compiled rule table.
pub fn save_rules(store: &mut dyn OptionStore, table: &RuleTable) -> Result<()> {
    store.set(REWRITE_RULES_KEY, serde_json::to_value(table)?)
}

/// Result of a content query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Matched item identifiers.
    pub ids: Vec<u64>,
    /// Whether the query addressed a single directly-addressable item.
    pub is_singular: bool,
}

/// Content storage contract consumed by the reverse resolver.
pub trait ContentStore {
    /// Look up a page by its full hierarchical path, e.g. `about/team`.
    fn page_by_path(&self, path: &str) -> Option<ContentItem>;

    /// Run a filter-map query against the stored items.
    fn query(&self, vars: &[(String, String)]) -> QueryResult;

    /// Registered content types with their query variable name and
    /// hierarchy flag.
    fn content_types(&self) -> Vec<ContentType>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_round_trip() {
        let mut store = MemoryOptionStore::new();
        assert!(load_rules(&store).unwrap().is_none());

        let mut table = RuleTable::new();
        table.insert("([0-9]{4})/?$", "index.php?year=$matches[1]");
        table.insert("([^/]+)/?$", "index.php?name=$matches[1]");
        save_rules(&mut store, &table).unwrap();

        let loaded = load_rules(&store).unwrap().unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.position("([0-9]{4})/?$"), Some(0));
    }
}
