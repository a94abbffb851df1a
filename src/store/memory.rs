//! In-memory stores: the test option store and the JSON content fixture.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ContentStore, OptionStore, QueryResult};

/// Option store backed by an in-memory ordered map.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    values: Map<String, Value>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> anyhow::Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One addressable content item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: u64,
    /// Content kind: `post`, `page`, `attachment`, or a custom type name.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// URL slug.
    pub name: String,
    /// Full hierarchical path (pages only), e.g. `about/team`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub monthnum: Option<u8>,
    #[serde(default)]
    pub day: Option<u8>,
}

fn default_kind() -> String {
    "post".to_string()
}

/// A registered content type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentType {
    pub name: String,
    /// Query variable addressing one item of this type, e.g. `product`.
    pub query_var: String,
    #[serde(default)]
    pub hierarchical: bool,
}

/// Serialized content fixture, loadable from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContentFixture {
    #[serde(default)]
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub types: Vec<ContentType>,
}

/// Content store over an in-memory fixture.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    items: Vec<ContentItem>,
    types: Vec<ContentType>,
    by_path: FxHashMap<String, usize>,
}

impl MemoryContentStore {
    pub fn new(fixture: ContentFixture) -> Self {
        let by_path = fixture
            .items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.path.clone().map(|p| (p.trim_matches('/').to_string(), i)))
            .collect();
        Self {
            items: fixture.items,
            types: fixture.types,
            by_path,
        }
    }

    pub fn push(&mut self, item: ContentItem) {
        if let Some(path) = &item.path {
            self.by_path
                .insert(path.trim_matches('/').to_string(), self.items.len());
        }
        self.items.push(item);
    }

    /// Query vars that pin the query to a single addressable item.
    fn is_singular_query(&self, vars: &[(String, String)]) -> bool {
        vars.iter().any(|(key, _)| {
            matches!(
                key.as_str(),
                "p" | "page_id" | "attachment_id" | "name" | "pagename" | "attachment"
            ) || self.types.iter().any(|t| t.query_var == *key)
        })
    }
}

impl ContentStore for MemoryContentStore {
    fn page_by_path(&self, path: &str) -> Option<ContentItem> {
        self.by_path
            .get(path.trim_matches('/'))
            .map(|&i| self.items[i].clone())
    }

    fn query(&self, vars: &[(String, String)]) -> QueryResult {
        let is_singular = self.is_singular_query(vars);

        let ids = self
            .items
            .iter()
            .filter(|item| {
                vars.iter().all(|(key, value)| match key.as_str() {
                    "p" | "page_id" | "attachment_id" => {
                        value.parse::<u64>().is_ok_and(|id| id == item.id)
                    }
                    "name" => item.name == *value,
                    "pagename" => item
                        .path
                        .as_deref()
                        .is_some_and(|p| p == value.trim_matches('/')),
                    "attachment" => item.kind == "attachment" && item.name == *value,
                    "post_type" => item.kind == *value,
                    "author_name" => item.author.as_deref() == Some(value.as_str()),
                    "year" => value.parse::<u16>().ok() == item.year,
                    "monthnum" => value.parse::<u8>().ok() == item.monthnum,
                    "day" => value.parse::<u8>().ok() == item.day,
                    // Pagination, feeds and endpoint vars don't narrow the
                    // item set.
                    _ => true,
                })
            })
            .map(|item| item.id)
            .collect();

        QueryResult { ids, is_singular }
    }

    fn content_types(&self) -> Vec<ContentType> {
        self.types.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> MemoryContentStore {
        let mut store = MemoryContentStore::default();
        store.push(ContentItem {
            id: 1,
            kind: "post".to_string(),
            name: "hello-world".to_string(),
            path: None,
            author: Some("ada".to_string()),
            year: Some(2024),
            monthnum: Some(5),
            day: Some(17),
        });
        store.push(ContentItem {
            id: 2,
            kind: "page".to_string(),
            name: "team".to_string(),
            path: Some("about/team".to_string()),
            author: None,
            year: None,
            monthnum: None,
            day: None,
        });
        store
    }

    #[test]
    fn test_query_by_name_is_singular() {
        let store = make_store();
        let result = store.query(&[("name".to_string(), "hello-world".to_string())]);
        assert!(result.is_singular);
        assert_eq!(result.ids, vec![1]);
    }

    #[test]
    fn test_query_by_date_is_not_singular() {
        let store = make_store();
        let result = store.query(&[("year".to_string(), "2024".to_string())]);
        assert!(!result.is_singular);
        assert_eq!(result.ids, vec![1]);
    }

    #[test]
    fn test_page_by_path() {
        let store = make_store();
        assert_eq!(store.page_by_path("about/team").unwrap().id, 2);
        assert_eq!(store.page_by_path("/about/team/").unwrap().id, 2);
        assert!(store.page_by_path("about/nobody").is_none());
    }

    #[test]
    fn test_date_and_name_narrow_together() {
        let store = make_store();
        let result = store.query(&[
            ("year".to_string(), "2024".to_string()),
            ("monthnum".to_string(), "05".to_string()),
            ("name".to_string(), "hello-world".to_string()),
        ]);
        assert!(result.is_singular);
        assert_eq!(result.ids, vec![1]);
    }
}
