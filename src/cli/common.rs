//! Shared helpers for CLI commands: engine and store construction.

use anyhow::{Context, Result};
use std::fs;

use crate::config::SiteConfig;
use crate::engine::RuleEngine;
use crate::store::{ContentFixture, FileOptionStore, MemoryContentStore};

/// Build the engine from config and move it into the routing phase,
/// executing any flush deferred during registration.
pub fn boot_engine(config: &SiteConfig) -> Result<(RuleEngine, FileOptionStore)> {
    let mut engine = RuleEngine::from_config(config);
    let mut store = FileOptionStore::open(config.options_path())?;
    engine.complete_registration(&mut store)?;
    Ok((engine, store))
}

/// Load the content fixture named in config, or an empty store.
pub fn load_content(config: &SiteConfig) -> Result<MemoryContentStore> {
    let fixture = match config.fixture_path() {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading content fixture `{}`", path.display()))?;
            serde_json::from_str::<ContentFixture>(&raw)
                .with_context(|| format!("parsing content fixture `{}`", path.display()))?
        }
        None => ContentFixture::default(),
    };
    Ok(MemoryContentStore::new(fixture))
}
