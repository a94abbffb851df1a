//! IIS URL Rewrite output.
//!
//! A single wildcard rule guarded by not-a-file / not-a-directory
//! conditions, rewriting everything else to the front controller.

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::io::Cursor;

use crate::engine::RuleEngine;

const ENVELOPE: &[&str] = &["configuration", "system.webServer", "rewrite", "rules"];

/// Render the IIS rule fragment; with `full_envelope` the fragment is
/// wrapped in the complete configuration document. An engine without a
/// permalink structure renders an empty string.
pub fn url_rewrite_rules(engine: &RuleEngine, full_envelope: bool) -> Result<String> {
    if !engine.using_permalinks() {
        return Ok(String::new());
    }

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    if full_envelope {
        for name in ENVELOPE {
            writer.write_event(Event::Start(BytesStart::new(*name)))?;
        }
    }

    let rule_name = format!("permaroute: {}", engine.home_url());
    let mut rule = BytesStart::new("rule");
    rule.push_attribute(("name", rule_name.as_str()));
    rule.push_attribute(("patternSyntax", "Wildcard"));
    writer.write_event(Event::Start(rule))?;

    let mut url_match = BytesStart::new("match");
    url_match.push_attribute(("url", "*"));
    writer.write_event(Event::Empty(url_match))?;

    writer.write_event(Event::Start(BytesStart::new("conditions")))?;
    for match_type in ["IsFile", "IsDirectory"] {
        let mut condition = BytesStart::new("add");
        condition.push_attribute(("input", "{REQUEST_FILENAME}"));
        condition.push_attribute(("matchType", match_type));
        condition.push_attribute(("negate", "true"));
        writer.write_event(Event::Empty(condition))?;
    }
    writer.write_event(Event::End(BytesEnd::new("conditions")))?;

    let mut action = BytesStart::new("action");
    action.push_attribute(("type", "Rewrite"));
    action.push_attribute(("url", engine.index()));
    writer.write_event(Event::Empty(action))?;

    writer.write_event(Event::End(BytesEnd::new("rule")))?;

    if full_envelope {
        for name in ENVELOPE.iter().rev() {
            writer.write_event(Event::End(BytesEnd::new(*name)))?;
        }
    }

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_engine_renders_nothing() {
        let engine = RuleEngine::new("", "index.php");
        assert_eq!(url_rewrite_rules(&engine, true).unwrap(), "");
    }

    #[test]
    fn test_fragment_shape() {
        let engine = RuleEngine::new("/%postname%/", "index.php");
        let out = url_rewrite_rules(&engine, false).unwrap();

        assert!(out.contains(r#"patternSyntax="Wildcard""#));
        assert!(out.contains(r#"<match url="*"/>"#));
        assert!(out.contains(r#"matchType="IsFile""#));
        assert!(out.contains(r#"matchType="IsDirectory""#));
        assert!(out.contains(r#"<action type="Rewrite" url="index.php"/>"#));
        assert!(!out.contains("<configuration>"));
    }

    #[test]
    fn test_full_envelope() {
        let engine = RuleEngine::new("/%postname%/", "index.php");
        let out = url_rewrite_rules(&engine, true).unwrap();

        assert!(out.starts_with("<configuration>"));
        assert!(out.trim_end().ends_with("</configuration>"));
        assert!(out.contains("<system.webServer>"));
        assert!(out.contains("<rewrite>"));
        assert!(out.contains("<rules>"));
    }
}
