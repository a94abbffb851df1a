//! Rewrite tags - `%tag%` placeholders and their substitution tables.
//!
//! A tag binds a placeholder in a permalink structure to a capture regex
//! and a query-variable prefix. The table is ordered; re-registering a tag
//! replaces its regex and query in place so relative priority between
//! overlapping tags stays stable.

use regex::Regex;
use std::sync::LazyLock;

/// Matches one `%tag%` token inside a permalink structure.
pub static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[^%]+%").expect("static token regex"));

/// One registered rewrite tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTag {
    /// Tag name including delimiters, e.g. `%postname%`.
    pub name: String,
    /// Capture regex substituted into match patterns, e.g. `([^/]+)`.
    pub regex: String,
    /// Query prefix substituted into query templates, e.g. `name=`.
    pub query: String,
}

/// Ordered tag registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTable {
    tags: Vec<RewriteTag>,
}

impl TagTable {
    /// The built-in tag set.
    pub fn builtin() -> Self {
        let tags = [
            ("%year%", "([0-9]{4})", "year="),
            ("%monthnum%", "([0-9]{1,2})", "monthnum="),
            ("%day%", "([0-9]{1,2})", "day="),
            ("%hour%", "([0-9]{1,2})", "hour="),
            ("%minute%", "([0-9]{1,2})", "minute="),
            ("%second%", "([0-9]{1,2})", "second="),
            ("%postname%", "([^/]+)", "name="),
            ("%post_id%", "([0-9]+)", "p="),
            ("%author%", "([^/]+)", "author_name="),
            ("%pagename%", "([^/]+?)", "pagename="),
            ("%search%", "(.+)", "s="),
        ];
        Self {
            tags: tags
                .iter()
                .map(|(name, regex, query)| RewriteTag {
                    name: (*name).to_string(),
                    regex: (*regex).to_string(),
                    query: (*query).to_string(),
                })
                .collect(),
        }
    }

    /// Register or replace a tag.
    ///
    /// Malformed names (shorter than 3 chars, or not `%`-delimited) are
    /// silently ignored so a bad registration never breaks an existing
    /// table. Replacing keeps the tag's position.
    pub fn register(&mut self, name: &str, regex: &str, query: &str) {
        if name.len() < 3 || !name.starts_with('%') || !name.ends_with('%') {
            return;
        }
        match self.tags.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                existing.regex = regex.to_string();
                existing.query = query.to_string();
            }
            None => self.tags.push(RewriteTag {
                name: name.to_string(),
                regex: regex.to_string(),
                query: query.to_string(),
            }),
        }
    }

    /// Remove a tag by name.
    pub fn remove(&mut self, name: &str) {
        self.tags.retain(|t| t.name != name);
    }

    pub fn get(&self, name: &str) -> Option<&RewriteTag> {
        self.tags.iter().find(|t| t.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|t| t.name == name)
    }

    /// Substitute every registered tag with its capture regex.
    /// Unregistered tokens are left alone and match as literal text.
    pub fn substitute_regex(&self, structure: &str) -> String {
        let mut out = structure.to_string();
        for tag in &self.tags {
            out = out.replace(&tag.name, &tag.regex);
        }
        out
    }

    /// Substitute a single token with its query prefix. Unregistered
    /// tokens are returned verbatim.
    pub fn query_prefix<'a>(&'a self, token: &'a str) -> &'a str {
        match self.get(token) {
            Some(tag) => &tag.query,
            None => token,
        }
    }

    /// Tokens of a structure, in order of appearance.
    pub fn tokenize<'a>(&self, structure: &'a str) -> Vec<&'a str> {
        TOKEN_RE.find_iter(structure).map(|m| m.as_str()).collect()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_postname() {
        let tags = TagTable::builtin();
        let tag = tags.get("%postname%").unwrap();
        assert_eq!(tag.regex, "([^/]+)");
        assert_eq!(tag.query, "name=");
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut tags = TagTable::builtin();
        let pos = tags.position("%pagename%").unwrap();
        tags.register("%pagename%", "(.?.+?)", "pagename=");

        assert_eq!(tags.position("%pagename%"), Some(pos));
        assert_eq!(tags.get("%pagename%").unwrap().regex, "(.?.+?)");
    }

    #[test]
    fn test_register_malformed_is_noop() {
        let mut tags = TagTable::builtin();
        let before = tags.clone();

        tags.register("year", "([0-9]{4})", "year=");
        tags.register("%%", "(x)", "x=");
        tags.register("%unclosed", "(x)", "x=");

        assert_eq!(tags, before);
    }

    #[test]
    fn test_substitute_leaves_unknown_tokens() {
        let tags = TagTable::builtin();
        let pattern = tags.substitute_regex("%year%/%bogus%/%postname%/");
        assert_eq!(pattern, "([0-9]{4})/%bogus%/([^/]+)/");
    }

    #[test]
    fn test_tokenize_order() {
        let tags = TagTable::builtin();
        let tokens = tags.tokenize("/archive/%year%/%monthnum%/%postname%/");
        assert_eq!(tokens, vec!["%year%", "%monthnum%", "%postname%"]);
    }
}
