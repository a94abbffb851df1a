//! Rules command implementation.

use anyhow::Result;

use super::common::boot_engine;
use crate::config::SiteConfig;
use crate::log;

/// Print the compiled rule table, as aligned text or a JSON object.
pub fn run_rules(json: bool, config: &SiteConfig) -> Result<()> {
    let (mut engine, mut store) = boot_engine(config)?;
    let table = engine.rules(&mut store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    let width = table.iter().map(|rule| rule.pattern.len()).max().unwrap_or(0);
    for rule in &table {
        println!("{:<width$}  {}", rule.pattern, rule.query);
    }
    log!("rules"; "{} rewrite rules", table.len());
    Ok(())
}
