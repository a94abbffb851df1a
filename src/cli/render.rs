//! Htaccess and webconfig command implementations.

use anyhow::Result;

use super::common::boot_engine;
use crate::config::SiteConfig;
use crate::render::{mod_rewrite_rules, url_rewrite_rules};

/// Render Apache mod_rewrite directives to stdout.
pub fn run_htaccess(config: &SiteConfig) -> Result<()> {
    let (mut engine, mut store) = boot_engine(config)?;
    // Keep the cached table current so routing and the rendered file agree.
    engine.rules(&mut store)?;
    println!("{}", mod_rewrite_rules(&mut engine));
    Ok(())
}

/// Render IIS url-rewrite XML to stdout.
pub fn run_webconfig(full: bool, config: &SiteConfig) -> Result<()> {
    let (mut engine, mut store) = boot_engine(config)?;
    engine.rules(&mut store)?;
    println!("{}", url_rewrite_rules(&engine, full)?);
    Ok(())
}
