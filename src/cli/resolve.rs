//! Resolve command implementation.

use anyhow::{Result, bail};

use super::common::{boot_engine, load_content};
use crate::config::SiteConfig;
use crate::resolve::url_to_id;

/// Resolve a pretty URL to the identifier of the item it addresses.
pub fn run_resolve(url: &str, config: &SiteConfig) -> Result<()> {
    let (mut engine, mut store) = boot_engine(config)?;
    let table = engine.rules(&mut store)?;
    let content = load_content(config)?;

    match url_to_id(&engine, &table, &content, url) {
        Some(id) => {
            println!("{id}");
            Ok(())
        }
        None => bail!("no single content item matches `{url}`"),
    }
}
