//! JSON-file-backed option store used by the CLI.
//!
//! The whole options map lives in one JSON object. Every write rewrites
//! the file; the host environment is trusted to serialize concurrent
//! writers, and last-write-wins is fine because the rule table is a pure
//! function of configuration.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::OptionStore;

pub struct FileOptionStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl FileOptionStore {
    /// Open (or create) the options file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading options file `{}`", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing options file `{}`", path.display()))?
        } else {
            Map::new()
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn persist(&self, values: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing options file `{}`", self.path.display()))
    }
}

impl OptionStore for FileOptionStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value);
        self.persist(&values)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let mut values = self.values.write();
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}
