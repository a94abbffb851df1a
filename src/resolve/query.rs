//! Query-template substitution and query-string parsing.

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Query variables the router recognizes on incoming requests. Anything
/// else that a rule produces is dropped before the content query runs.
pub const PUBLIC_QUERY_VARS: &[&str] = &[
    "m",
    "p",
    "w",
    "s",
    "search",
    "exact",
    "sentence",
    "page",
    "paged",
    "more",
    "tb",
    "author",
    "order",
    "orderby",
    "year",
    "monthnum",
    "day",
    "hour",
    "minute",
    "second",
    "name",
    "category_name",
    "tag",
    "feed",
    "withcomments",
    "author_name",
    "pagename",
    "page_id",
    "error",
    "attachment",
    "attachment_id",
    "robots",
    "favicon",
    "taxonomy",
    "term",
    "cpage",
    "post_type",
    "signup",
    "activate",
];

/// `$matches[N]` or `$N` placeholders inside a query template.
static BACKREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$matches\[([0-9]+)\]|\$([0-9]+)").expect("static regex"));

/// Substitute captured path segments into a query template. Captures are
/// percent-encoded the way a browser would submit them.
pub fn substitute_backrefs(template: &str, captures: &Captures) -> String {
    BACKREF_RE
        .replace_all(template, |m: &Captures| {
            let index: usize = m
                .get(1)
                .or_else(|| m.get(2))
                .and_then(|g| g.as_str().parse().ok())
                .unwrap_or(0);
            match captures.get(index) {
                Some(capture) => {
                    utf8_percent_encode(capture.as_str(), NON_ALPHANUMERIC).to_string()
                }
                None => String::new(),
            }
        })
        .into_owned()
}

/// Parse a query string into decoded (key, value) pairs, preserving
/// order. Empty pairs (from templates like `index.php?&paged=2`) are
/// dropped.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() {
                return None;
            }
            Some((decode(key), decode(value)))
        })
        .collect()
}

fn decode(s: &str) -> String {
    percent_decode_str(s)
        .decode_utf8()
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_matches_style() {
        let re = Regex::new("^([0-9]{4})/([^/]+)/?$").unwrap();
        let caps = re.captures("2024/hello-world/").unwrap();
        let out = substitute_backrefs(
            "index.php?year=$matches[1]&name=$matches[2]",
            &caps,
        );
        assert_eq!(out, "index.php?year=2024&name=hello%2Dworld");
    }

    #[test]
    fn test_substitute_indexed_style() {
        let re = Regex::new("^([^/]+)/?$").unwrap();
        let caps = re.captures("about/").unwrap();
        assert_eq!(
            substitute_backrefs("index.php?pagename=$1", &caps),
            "index.php?pagename=about"
        );
    }

    #[test]
    fn test_substitute_missing_capture_is_empty() {
        let re = Regex::new("^([0-9]{4})(?:/([0-9]{1,2}))?/?$").unwrap();
        let caps = re.captures("2024/").unwrap();
        assert_eq!(
            substitute_backrefs("index.php?year=$matches[1]&monthnum=$matches[2]", &caps),
            "index.php?year=2024&monthnum="
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let vars = parse_query_string("year=2024&name=hello%2Dworld&paged=");
        assert_eq!(
            vars,
            vec![
                ("year".to_string(), "2024".to_string()),
                ("name".to_string(), "hello-world".to_string()),
                ("paged".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_drops_empty_pairs() {
        let vars = parse_query_string("&paged=2");
        assert_eq!(vars, vec![("paged".to_string(), "2".to_string())]);
    }
}
