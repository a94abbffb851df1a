//! Flush command implementation.

use anyhow::Result;

use crate::config::SiteConfig;
use crate::engine::{FlushMode, RuleEngine};
use crate::log;
use crate::store::FileOptionStore;

/// Drop the cached rule table and rebuild it from config.
pub fn run_flush(hard: bool, config: &SiteConfig) -> Result<()> {
    let mut engine = RuleEngine::from_config(config);
    let mut store = FileOptionStore::open(config.options_path())?;

    let mode = if hard { FlushMode::Hard } else { FlushMode::Soft };
    // Requested during registration, so it coalesces and runs once here.
    engine.flush_rules(&mut store, mode)?;
    engine.complete_registration(&mut store)?;

    let table = engine.rules(&mut store)?;
    log!("flush"; "rebuilt {} rewrite rules", table.len());
    if hard {
        log!("flush"; "re-render .htaccess/web.config with `htaccess`/`webconfig` to match");
    }
    Ok(())
}
