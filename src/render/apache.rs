//! Apache mod_rewrite output.
//!
//! Non-verbose mode emits one guarded catch-all that defers everything to
//! the front controller. Verbose mode emits one line per compiled rule,
//! with the filesystem-existence guards consolidated into a single
//! skip-count condition so matching a real file costs two checks, not one
//! per rule.

use super::url_root_path;
use crate::engine::RuleEngine;

/// Render the rewrite block, or an empty string when no permalink
/// structure is configured.
pub fn mod_rewrite_rules(engine: &mut RuleEngine) -> String {
    if !engine.using_permalinks() {
        return String::new();
    }

    let home_root = url_root_path(engine.home_url());
    let site_root = url_root_path(engine.site_url());
    let index = engine.index().to_string();

    let mut out = String::new();
    out.push_str("<IfModule mod_rewrite.c>\n");
    out.push_str("RewriteEngine On\n");
    out.push_str(&format!("RewriteBase {home_root}\n"));
    // The front controller itself must never be rewritten.
    out.push_str(&format!("RewriteRule ^{} - [L]\n", regex::escape(&index)));

    // Rules that redirect outside the router come first, unguarded.
    let external = engine.non_router_rules().clone();
    for rule in &external {
        let pattern = degreedify(&rule.pattern);
        out.push_str(&format!(
            "RewriteRule ^{pattern} {home_root}{} [QSA,L]\n",
            rule.query
        ));
    }

    if engine.use_verbose_rules() {
        let table = engine.indexed_rewrite_rules();
        out.push_str("RewriteCond %{REQUEST_FILENAME} -f [OR]\n");
        out.push_str("RewriteCond %{REQUEST_FILENAME} -d\n");
        out.push_str(&format!("RewriteRule ^.*$ - [S={}]\n", table.len()));
        for rule in &table {
            let pattern = degreedify(&rule.pattern);
            // Front-controller queries stay under the home root; anything
            // else points at the install location.
            let root = if rule.query.contains(&index) {
                &home_root
            } else {
                &site_root
            };
            out.push_str(&format!("RewriteRule ^{pattern} {root}{} [QSA,L]\n", rule.query));
        }
    } else {
        out.push_str("RewriteCond %{REQUEST_FILENAME} !-f\n");
        out.push_str("RewriteCond %{REQUEST_FILENAME} !-d\n");
        out.push_str(&format!("RewriteRule . {home_root}{index} [L]\n"));
    }

    out.push_str("</IfModule>\n");
    out
}

/// Old Apache regex engines don't support the reluctant quantifier;
/// greedy matching is equivalent here because every `.+?` in generated
/// patterns is followed by an anchor-bound suffix.
fn degreedify(pattern: &str) -> String {
    pattern.replace(".+?", ".+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_engine_renders_nothing() {
        let mut engine = RuleEngine::new("", "index.php");
        assert_eq!(mod_rewrite_rules(&mut engine), "");
    }

    #[test]
    fn test_catch_all_block() {
        let mut engine = RuleEngine::new("/%postname%/", "index.php");
        let out = mod_rewrite_rules(&mut engine);

        assert!(out.starts_with("<IfModule mod_rewrite.c>\n"));
        assert!(out.ends_with("</IfModule>\n"));
        assert!(out.contains("RewriteBase /\n"));
        assert!(out.contains("RewriteCond %{REQUEST_FILENAME} !-f\n"));
        assert!(out.contains("RewriteCond %{REQUEST_FILENAME} !-d\n"));
        assert!(out.contains("RewriteRule . /index.php [L]\n"));
        // Catch-all mode never spells out individual rules.
        assert!(!out.contains("[QSA,L]"));
    }

    #[test]
    fn test_verbose_block_lists_rules_with_skip_guard() {
        let mut engine = RuleEngine::new("/%postname%/", "index.php");
        engine.set_verbose_rules(true);
        let out = mod_rewrite_rules(&mut engine);

        let rule_count = engine.indexed_rewrite_rules().len();
        assert!(out.contains("RewriteCond %{REQUEST_FILENAME} -f [OR]\n"));
        assert!(out.contains(&format!("RewriteRule ^.*$ - [S={rule_count}]\n")));
        // Verbose rules carry indexed back-references, not $matches[N].
        assert!(out.contains("$1"));
        assert!(!out.contains("$matches["));
    }

    #[test]
    fn test_reluctant_quantifier_rewritten() {
        let mut engine = RuleEngine::new("/%postname%/", "index.php");
        engine.set_verbose_rules(true);
        let out = mod_rewrite_rules(&mut engine);
        assert!(!out.contains(".+?"));
    }

    #[test]
    fn test_external_rules_come_before_guards() {
        let mut engine = RuleEngine::new("/%postname%/", "index.php");
        engine.add_external_rule("downloads/(.*)", "files.php?file=$1");
        let out = mod_rewrite_rules(&mut engine);

        let external = out.find("downloads/").unwrap();
        let guard = out.find("RewriteCond").unwrap();
        assert!(external < guard);
    }
}
