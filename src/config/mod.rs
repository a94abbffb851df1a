//! Site configuration loaded from a TOML file.
//!
//! The config describes the site layout (home URL, front controller),
//! the permalink structure and its bases, the content fixture, and any
//! extra rewrite endpoints. Unknown keys are warned about rather than
//! rejected so older configs keep loading.

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::EndpointMask;
use crate::log;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub permalinks: PermalinksSection,
    pub content: ContentSection,
    #[serde(rename = "endpoint")]
    pub endpoints: Vec<EndpointConfig>,

    /// Path the config was loaded from, for resolving relative paths.
    #[serde(skip)]
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    /// Public home URL, possibly mounted under a subdirectory.
    pub url: String,
    /// Where the front controller actually lives. Defaults to `url`.
    pub site_url: Option<String>,
    /// Front controller filename.
    pub index: String,
    /// Page id shown at the site root, if any.
    pub page_on_front: Option<u64>,
    /// Emit signup/activation rules.
    pub registration_pages: bool,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            url: "http://localhost".into(),
            site_url: None,
            index: "index.php".into(),
            page_on_front: None,
            registration_pages: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PermalinksSection {
    /// Permalink structure, e.g. `/%year%/%monthnum%/%postname%/`.
    /// Empty means plain query-string links.
    pub structure: String,
    /// Emit one Apache rule per rewrite instead of a catch-all.
    pub verbose_rewrite: bool,
    pub author_base: String,
    pub search_base: String,
    pub comments_base: String,
    pub feed_base: String,
    pub pagination_base: String,
    pub comments_pagination_base: String,
    /// Feed suffixes; the first is the canonical one.
    pub feeds: Vec<String>,
    pub category_base: String,
    pub tag_base: String,
}

impl Default for PermalinksSection {
    fn default() -> Self {
        Self {
            structure: String::new(),
            verbose_rewrite: false,
            author_base: "author".into(),
            search_base: "search".into(),
            comments_base: "comments".into(),
            feed_base: "feed".into(),
            pagination_base: "page".into(),
            comments_pagination_base: "comment-page".into(),
            feeds: vec!["feed".into(), "rdf".into(), "rss".into(), "rss2".into(), "atom".into()],
            category_base: "category".into(),
            tag_base: "tag".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    /// JSON fixture of known content items, used by `resolve`.
    pub fixture: Option<PathBuf>,
    /// Where cached rules and options persist.
    pub options: PathBuf,
    #[serde(rename = "type")]
    pub types: Vec<ContentTypeConfig>,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self { fixture: None, options: PathBuf::from(".permaroute/options.json"), types: Vec::new() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentTypeConfig {
    pub name: String,
    #[serde(default)]
    pub hierarchical: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    /// Endpoint place names, e.g. `["permalink", "pages"]`.
    pub places: Vec<String>,
    pub query_var: Option<String>,
}

impl EndpointConfig {
    pub fn mask(&self) -> EndpointMask {
        let mut mask = EndpointMask::NONE;
        for place in &self.places {
            match EndpointMask::from_name(place) {
                Some(m) => mask |= m,
                None => log!("config"; "unknown endpoint place '{place}' ignored"),
            }
        }
        mask
    }

    pub fn query_var(&self) -> String {
        self.query_var.clone().unwrap_or_else(|| self.name.clone())
    }
}

// =============================================================================
// Loading
// =============================================================================

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let deserializer = toml::Deserializer::new(&raw);
        let mut unknown = Vec::new();
        let mut config: SiteConfig =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                unknown.push(path.to_string());
            })?;

        for key in unknown {
            log!("config"; "unknown key '{key}' in {}", path.display());
        }

        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.site.index.trim().is_empty() {
            return Err(ConfigError::Validation("site.index must not be empty".into()));
        }
        if self.permalinks.feeds.is_empty() {
            return Err(ConfigError::Validation("permalinks.feeds must not be empty".into()));
        }
        let structure = self.permalinks.structure.trim();
        if !structure.is_empty() && !structure.contains('%') {
            return Err(ConfigError::Validation(format!(
                "permalink structure '{structure}' contains no %tag% tokens"
            )));
        }
        Ok(())
    }

    /// Path component of the home URL, without a trailing slash.
    pub fn home_path(&self) -> String {
        match url::Url::parse(&self.site.url) {
            Ok(u) => u.path().trim_end_matches('/').to_string(),
            Err(_) => String::new(),
        }
    }

    pub fn options_path(&self) -> PathBuf {
        self.resolve(&self.content.options)
    }

    pub fn fixture_path(&self) -> Option<PathBuf> {
        self.content.fixture.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            match self.config_path.parent() {
                Some(dir) => dir.join(p),
                None => p.to_path_buf(),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
