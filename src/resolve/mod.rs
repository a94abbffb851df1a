//! Reverse lookup: incoming URL -> content identifier.
//!
//! Scans the compiled rule table in order, substitutes the first matching
//! pattern's captures into its query template, filters the query down to
//! recognized variables and runs it against the content store. Ambiguity
//! (zero or many results) is not an error, just "no identifier".

pub mod query;

use regex::Regex;
use std::sync::LazyLock;

use crate::debug;
use crate::engine::{RuleEngine, RuleTable};
use crate::store::ContentStore;
use query::{PUBLIC_QUERY_VARS, parse_query_string, substitute_backrefs};

/// Direct numeric identifier in the query string; short-circuits the
/// table scan entirely.
static DIRECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&](p|page_id|attachment_id)=([0-9]+)").expect("static regex"));

/// Page-shaped query templates that need verification against stored
/// page paths before the match is accepted.
static VERBOSE_PAGE_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pagename=\$matches\[([0-9]+)\]").expect("static regex"));

/// Query part of a rule template (everything after the first `?`).
static TEMPLATE_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+?\?").expect("static regex"));

/// Resolve a URL to the identifier of the single item it addresses.
///
/// Returns `None` when no permalink structure is configured, nothing in
/// the table matches, or the resulting query is ambiguous or empty.
pub fn url_to_id(
    engine: &RuleEngine,
    table: &RuleTable,
    content: &dyn ContentStore,
    url: &str,
) -> Option<u64> {
    // A direct `p=`/`page_id=`/`attachment_id=` wins outright.
    if let Some(caps) = DIRECT_ID_RE.captures(url)
        && let Ok(id) = caps[2].parse::<u64>()
        && id > 0
    {
        return Some(id);
    }

    if !engine.using_permalinks() || table.is_empty() {
        return None;
    }

    let request = normalize(engine, url)?;
    let type_vars = content_type_vars(content);
    let endpoint_vars: Vec<&str> = engine.endpoints().iter().map(|ep| ep.query_var.as_str()).collect();

    for rule in table {
        let anchored = format!("^{}", rule.pattern);
        let Ok(re) = Regex::new(&anchored) else {
            debug!("resolve"; "skipping unparseable pattern `{}`", rule.pattern);
            continue;
        };
        let Some(caps) = re.captures(&request) else {
            continue;
        };

        // A page-shaped match is only accepted when the captured path is
        // a real stored page; otherwise keep scanning so a post rule
        // further down can claim the URL.
        if engine.use_verbose_page_rules()
            && let Some(var) = VERBOSE_PAGE_VAR_RE.captures(&rule.query)
        {
            let index: usize = var[1].parse().ok()?;
            let path = caps.get(index).map(|m| m.as_str()).unwrap_or_default();
            if content.page_by_path(path).is_none() {
                continue;
            }
        }

        let template = TEMPLATE_QUERY_RE.replace(&rule.query, "");
        let substituted = substitute_backrefs(&template, &caps);
        let vars = parse_query_string(&substituted);

        let mut filtered: Vec<(String, String)> = Vec::with_capacity(vars.len());
        for (key, value) in vars {
            let public = PUBLIC_QUERY_VARS.contains(&key.as_str())
                || endpoint_vars.contains(&key.as_str())
                || type_vars.iter().any(|(var, _)| *var == key);
            if !public {
                continue;
            }
            // Content-type query vars address one item of that type.
            if let Some((_, type_name)) = type_vars.iter().find(|(var, _)| *var == key) {
                filtered.push(("post_type".to_string(), type_name.clone()));
                filtered.push(("name".to_string(), value.clone()));
            }
            filtered.push((key, value));
        }

        let result = content.query(&filtered);
        if result.is_singular && !result.ids.is_empty() {
            return Some(result.ids[0]);
        }
        return None;
    }

    None
}

/// Strip the URL down to the path the rule table was compiled against.
fn normalize(engine: &RuleEngine, url: &str) -> Option<String> {
    let url = url.split('#').next().unwrap_or(url);
    let url = url.split('?').next().unwrap_or(url);

    let home = url::Url::parse(engine.home_url()).ok()?;
    let home_host = home.host_str().unwrap_or_default().trim_start_matches("www.");
    let home_path = home.path().trim_end_matches('/');

    let mut path = if let Ok(parsed) = url::Url::parse(url) {
        // Absolute URL: it must live on our host, modulo a `www.` prefix.
        let host = parsed.host_str().unwrap_or_default().trim_start_matches("www.");
        if host != home_host {
            return None;
        }
        parsed.path().to_string()
    } else {
        url.to_string()
    };

    if !home_path.is_empty() && path.starts_with(home_path) {
        path = path[home_path.len()..].to_string();
    }

    // With true rewrite support the front-controller path never appears
    // in clean URLs; strip it if a caller passed it anyway.
    if !engine.using_index_permalinks() {
        path = path.replace(&format!("{}/", engine.index()), "");
    }

    Some(path.trim_start_matches('/').to_string())
}

fn content_type_vars(content: &dyn ContentStore) -> Vec<(String, String)> {
    content
        .content_types()
        .into_iter()
        .map(|t| (t.query_var, t.name))
        .collect()
}
