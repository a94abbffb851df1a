//! Rewrite-rule engine.
//!
//! `RuleEngine` owns the permalink structure, the tag/endpoint/permastruct
//! registries and the structural walk that compiles everything into an
//! ordered rule table. One instance is constructed per application
//! context and passed explicitly to whatever needs routing.
//!
//! ```text
//! engine/
//! ├── tags         # %tag% registry and substitution
//! ├── endpoint     # EndpointMask + Endpoint
//! ├── permastruct  # Permastruct + GenerateOpts
//! ├── rules        # RewriteRule / RuleTable
//! ├── generate     # the per-structure rule walk
//! ├── structures   # derived permastructs (date endianness etc.)
//! ├── transform    # per-stage rule transforms
//! └── lifecycle    # two-phase init + deferred flush
//! ```

mod endpoint;
mod generate;
mod lifecycle;
mod permastruct;
mod rules;
mod structures;
mod tags;
mod transform;

#[cfg(test)]
mod tests;

pub use endpoint::{Endpoint, EndpointMask};
pub use lifecycle::{FlushMode, Phase};
pub use permastruct::{GenerateOpts, Permastruct};
pub use rules::{BackrefStyle, RuleTable};
pub use tags::TagTable;
pub use transform::TransformRegistry;

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::config::SiteConfig;
use crate::store::{self, OptionStore};
use structures::DerivedStructs;

/// Where an extra rule is placed relative to the generated families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePosition {
    Top,
    Bottom,
}

/// A content type registered for permalink generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeTag {
    pub name: String,
    pub hierarchical: bool,
}

/// Structures whose first tag makes one-segment URLs ambiguous with page
/// paths, forcing verbose page matching.
static VERBOSE_PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^%]*%(?:postname|category|tag|author)%").expect("static regex"));

/// The rewrite-rule engine. See the module docs for the moving parts.
pub struct RuleEngine {
    permalink_structure: String,
    /// Front-controller entry path, e.g. `index.php`.
    index: String,
    /// Literal prefix before the first tag in the structure.
    front: String,
    /// Prefix applied when clean URLs run through the front controller
    /// path itself (no server rewrite support).
    root: String,
    home_url: String,
    site_url: String,
    home_is_root: bool,
    use_trailing_slashes: bool,
    use_verbose_rules: bool,
    use_verbose_page_rules: bool,
    registration_pages: bool,
    page_on_front: Option<u64>,
    backref: BackrefStyle,

    author_base: String,
    search_base: String,
    comments_base: String,
    feed_base: String,
    pagination_base: String,
    comments_pagination_base: String,
    feeds: Vec<String>,

    tags: TagTable,
    endpoints: Vec<Endpoint>,
    content_types: Vec<ContentTypeTag>,
    extra_permastructs: Vec<(String, Permastruct)>,
    extra_rules_top: RuleTable,
    extra_rules: RuleTable,
    non_router_rules: RuleTable,
    transforms: TransformRegistry,

    derived: DerivedStructs,
    phase: Phase,
    pending_flush: Option<FlushMode>,
}

impl RuleEngine {
    /// Engine with default bases; the starting point for tests and
    /// embedders that don't go through a config file.
    pub fn new(permalink_structure: &str, index: &str) -> Self {
        let mut engine = Self {
            permalink_structure: permalink_structure.to_string(),
            index: index.to_string(),
            front: String::new(),
            root: String::new(),
            home_url: "http://localhost".to_string(),
            site_url: "http://localhost".to_string(),
            home_is_root: true,
            use_trailing_slashes: false,
            use_verbose_rules: false,
            use_verbose_page_rules: false,
            registration_pages: false,
            page_on_front: None,
            backref: BackrefStyle::Matches,
            author_base: "author".to_string(),
            search_base: "search".to_string(),
            comments_base: "comments".to_string(),
            feed_base: "feed".to_string(),
            pagination_base: "page".to_string(),
            comments_pagination_base: "comment-page".to_string(),
            feeds: ["feed", "rdf", "rss", "rss2", "atom"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            tags: TagTable::builtin(),
            endpoints: Vec::new(),
            content_types: Vec::new(),
            extra_permastructs: Vec::new(),
            extra_rules_top: RuleTable::new(),
            extra_rules: RuleTable::new(),
            non_router_rules: RuleTable::new(),
            transforms: TransformRegistry::new(),
            derived: DerivedStructs::default(),
            phase: Phase::Registration,
            pending_flush: None,
        };
        engine.init();
        engine
    }

    /// Engine wired from the loaded site configuration. Category/tag
    /// permastructs and config-declared endpoints are registered here.
    pub fn from_config(config: &SiteConfig) -> Self {
        let mut engine = Self::new(&config.permalinks.structure, &config.site.index);
        engine.home_url = config.site.url.trim_end_matches('/').to_string();
        engine.site_url = config
            .site
            .site_url
            .as_deref()
            .unwrap_or(&config.site.url)
            .trim_end_matches('/')
            .to_string();
        engine.home_is_root = config.home_path().is_empty();
        engine.use_verbose_rules = config.permalinks.verbose_rewrite;
        engine.registration_pages = config.site.registration_pages;
        engine.page_on_front = config.site.page_on_front;
        engine.author_base = config.permalinks.author_base.clone();
        engine.search_base = config.permalinks.search_base.clone();
        engine.comments_base = config.permalinks.comments_base.clone();
        engine.feed_base = config.permalinks.feed_base.clone();
        engine.pagination_base = config.permalinks.pagination_base.clone();
        engine.comments_pagination_base = config.permalinks.comments_pagination_base.clone();
        engine.feeds = config.permalinks.feeds.clone();
        engine.init();

        // Empty bases disable the taxonomy families.
        let category_base = config.permalinks.category_base.trim_matches('/');
        if !category_base.is_empty() {
            engine.add_rewrite_tag("%category%", "(.+?)", "category_name=");
            engine.add_permastruct(
                "category",
                Permastruct::new(format!("{category_base}/%category%"))
                    .ep_mask(EndpointMask::CATEGORIES),
            );
        }
        let tag_base = config.permalinks.tag_base.trim_matches('/');
        if !tag_base.is_empty() {
            engine.add_rewrite_tag("%tag%", "([^/]+)", "tag=");
            engine.add_permastruct(
                "post_tag",
                Permastruct::new(format!("{tag_base}/%tag%")).ep_mask(EndpointMask::TAGS),
            );
        }
        for ep in &config.endpoints {
            engine.add_rewrite_endpoint(ep.mask(), &ep.name, &ep.query_var());
        }
        for ct in &config.content.types {
            engine.add_content_type(&ct.name, ct.hierarchical);
        }
        engine
    }

    /// Recompute the structure-derived state and clear every memoized
    /// derived structure. Called whenever the permalink structure or one
    /// of the dependent bases changes.
    pub fn init(&mut self) {
        self.front = self.permalink_structure
            [..self.permalink_structure.find('%').unwrap_or(0)]
            .to_string();
        self.root = if self.using_index_permalinks() {
            format!("{}/", self.index)
        } else {
            String::new()
        };
        self.use_trailing_slashes = self.permalink_structure.ends_with('/');
        self.use_verbose_page_rules = VERBOSE_PAGE_RE.is_match(&self.permalink_structure);
        self.derived = DerivedStructs::default();
    }

    // ========================================================================
    // State queries
    // ========================================================================

    /// Is a permalink structure configured at all? When not, every
    /// accessor yields its disabled value and the rule table is empty.
    pub fn using_permalinks(&self) -> bool {
        !self.permalink_structure.is_empty()
    }

    /// Clean URLs routed through the front-controller path itself
    /// (e.g. `/index.php/2024/05/post/`), for hosts without rewrite
    /// support.
    pub fn using_index_permalinks(&self) -> bool {
        if self.permalink_structure.is_empty() {
            return false;
        }
        self.permalink_structure
            .trim_start_matches('/')
            .starts_with(&self.index)
    }

    pub fn permalink_structure(&self) -> &str {
        &self.permalink_structure
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn home_url(&self) -> &str {
        &self.home_url
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    pub fn use_verbose_rules(&self) -> bool {
        self.use_verbose_rules
    }

    /// Emit one explicit server-config line per rule instead of the
    /// guarded catch-all.
    pub fn set_verbose_rules(&mut self, verbose: bool) {
        self.use_verbose_rules = verbose;
    }

    /// Whether generated permalinks carry a trailing slash (the
    /// configured structure ends with `/`).
    pub fn use_trailing_slashes(&self) -> bool {
        self.use_trailing_slashes
    }

    pub fn use_verbose_page_rules(&self) -> bool {
        self.use_verbose_page_rules
    }

    pub fn non_router_rules(&self) -> &RuleTable {
        &self.non_router_rules
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn tag_table(&self) -> &TagTable {
        &self.tags
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Change the permalink structure; triggers a full re-init.
    pub fn set_permalink_structure(&mut self, structure: &str) {
        if self.permalink_structure != structure {
            self.permalink_structure = structure.to_string();
            self.init();
        }
    }

    /// Register or replace a rewrite tag. Malformed names are ignored.
    pub fn add_rewrite_tag(&mut self, name: &str, regex: &str, query: &str) {
        self.tags.register(name, regex, query);
    }

    /// Register an endpoint suffix for every family matching `mask`.
    pub fn add_rewrite_endpoint(&mut self, mask: EndpointMask, name: &str, query_var: &str) {
        self.endpoints.push(Endpoint::new(mask, name, query_var));
    }

    /// Register a named permastruct. Re-registering a name replaces it.
    pub fn add_permastruct(&mut self, name: &str, permastruct: Permastruct) {
        match self.extra_permastructs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = permastruct,
            None => self.extra_permastructs.push((name.to_string(), permastruct)),
        }
    }

    pub fn remove_permastruct(&mut self, name: &str) {
        self.extra_permastructs.retain(|(n, _)| n != name);
    }

    /// Register a content type whose `%name%` tag marks a rule level as a
    /// single entity.
    pub fn add_content_type(&mut self, name: &str, hierarchical: bool) {
        self.tags.register(
            &format!("%{name}%"),
            "([^/]+)",
            &format!("{name}="),
        );
        self.content_types.push(ContentTypeTag {
            name: name.to_string(),
            hierarchical,
        });
    }

    /// Register a hand-written rule ahead of or behind the generated
    /// families.
    pub fn add_rule(&mut self, pattern: &str, query: &str, position: RulePosition) {
        match position {
            RulePosition::Top => self.extra_rules_top.insert(pattern, query),
            RulePosition::Bottom => self.extra_rules.insert(pattern, query),
        }
    }

    /// Register a rule that redirects outside the router entirely; only
    /// the server-config renderers emit these.
    pub fn add_external_rule(&mut self, pattern: &str, query: &str) {
        self.non_router_rules.insert(pattern, query);
    }

    /// Register a transform for a rule-family stage.
    pub fn add_transform<F>(&mut self, stage: &str, transform: F)
    where
        F: Fn(RuleTable) -> RuleTable + Send + Sync + 'static,
    {
        self.transforms.register(stage, transform);
    }

    // ========================================================================
    // Compilation
    // ========================================================================

    /// Page rules. `%pagename%` is (re)registered with a leading `.?` so
    /// the capture cannot collide with sibling patterns, and page paths
    /// are matched as a whole (no directory walk).
    pub fn page_rewrite_rules(&mut self) -> RuleTable {
        self.tags.register("%pagename%", "(.?.+?)", "pagename=");
        match self.get_page_permastruct() {
            Some(structure) => {
                let opts = GenerateOpts {
                    ep_mask: EndpointMask::PAGES,
                    walk_dirs: false,
                    ..GenerateOpts::default()
                };
                self.generate_rewrite_rules(&structure, &opts)
            }
            None => RuleTable::new(),
        }
    }

    /// Compile the complete ordered rule table.
    ///
    /// Family precedence, first match wins: extra top rules, custom
    /// permastructs, fixed infrastructure, root, comments, search,
    /// author, date, then page/post in an order decided by the verbose
    /// page flag, then extra bottom rules.
    pub fn rewrite_rules(&mut self) -> RuleTable {
        if !self.using_permalinks() {
            return RuleTable::new();
        }

        let post_rewrite = self.generate_rewrite_rules(
            &self.permalink_structure.clone(),
            &GenerateOpts::with_mask(EndpointMask::PERMALINK),
        );
        let post_rewrite = self.transforms.apply("post", post_rewrite);

        let (Some(date_structure), Some(search_structure), Some(author_structure)) = (
            self.get_date_permastruct(),
            self.get_search_permastruct(),
            self.get_author_permastruct(),
        ) else {
            return RuleTable::new();
        };

        let date_rewrite = self
            .generate_rewrite_rules(&date_structure, &GenerateOpts::with_mask(EndpointMask::DATE));
        let date_rewrite = self.transforms.apply("date", date_rewrite);

        let root_rewrite = self.generate_rewrite_rules(
            &format!("{}/", self.root),
            &GenerateOpts::with_mask(EndpointMask::ROOT),
        );
        let root_rewrite = self.transforms.apply("root", root_rewrite);

        let comments_rewrite = self.generate_rewrite_rules(
            &format!("{}{}", self.root, self.comments_base),
            &GenerateOpts {
                ep_mask: EndpointMask::COMMENTS,
                paged: false,
                for_comments: true,
                walk_dirs: false,
                ..GenerateOpts::default()
            },
        );
        let comments_rewrite = self.transforms.apply("comments", comments_rewrite);

        let search_rewrite = self.generate_rewrite_rules(
            &search_structure,
            &GenerateOpts::with_mask(EndpointMask::SEARCH),
        );
        let search_rewrite = self.transforms.apply("search", search_rewrite);

        let author_rewrite = self.generate_rewrite_rules(
            &author_structure,
            &GenerateOpts::with_mask(EndpointMask::AUTHORS),
        );
        let author_rewrite = self.transforms.apply("author", author_rewrite);

        let page_rewrite = self.page_rewrite_rules();
        let page_rewrite = self.transforms.apply("page", page_rewrite);

        // Custom permastructs land ahead of the built-in families.
        let mut custom = RuleTable::new();
        for (name, permastruct) in self.extra_permastructs.clone() {
            let structure = if permastruct.with_front {
                format!("{}{}", self.front, permastruct.structure.trim_start_matches('/'))
            } else {
                permastruct.structure.clone()
            };
            let generated = self.generate_rewrite_rules(&structure, &permastruct.opts);
            custom.extend(self.transforms.apply(&name, generated));
        }

        let mut rules = RuleTable::new();
        rules.extend(self.extra_rules_top.clone());
        rules.extend(custom);

        // Fixed infrastructure rules. robots/favicon only make sense when
        // the router is mounted at the domain root.
        if self.home_is_root {
            rules.insert(r"robots\.txt$", format!("{}?robots=1", self.index));
            rules.insert(r"favicon\.ico$", format!("{}?favicon=1", self.index));
        }
        rules.insert(
            r".*(atom|rdf|rss|rss2)\.xml$",
            format!("{}?feed=old", self.index),
        );
        if self.registration_pages {
            rules.insert("signup/?$", format!("{}?signup=true", self.index));
            rules.insert("activate/?$", format!("{}?activate=true", self.index));
        }

        rules.extend(root_rewrite);
        rules.extend(comments_rewrite);
        rules.extend(search_rewrite);
        rules.extend(author_rewrite);
        rules.extend(date_rewrite);

        // Page URLs and post URLs can collapse to the same shape; table
        // position decides which family gets first shot.
        if self.use_verbose_page_rules {
            rules.extend(page_rewrite);
            rules.extend(post_rewrite);
        } else {
            rules.extend(post_rewrite);
            rules.extend(page_rewrite);
        }

        rules.extend(self.extra_rules.clone());
        rules
    }

    /// The compiled table with `$N` back-references, as server configs
    /// expect.
    pub fn indexed_rewrite_rules(&mut self) -> RuleTable {
        let previous = self.backref;
        self.backref = BackrefStyle::Indexed;
        let table = self.rewrite_rules();
        self.backref = previous;
        table
    }

    /// The rule table, read through the persistent cache. An absent or
    /// empty cached table triggers a rebuild and re-persist.
    pub fn rules(&mut self, store: &mut dyn OptionStore) -> Result<RuleTable> {
        if let Some(cached) = store::load_rules(store)?
            && !cached.is_empty()
        {
            return Ok(cached);
        }
        let table = self.rewrite_rules();
        store::save_rules(store, &table)?;
        Ok(table)
    }
}
