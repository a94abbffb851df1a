//! Whole-table tests for the rule engine.
//!
//! These compile full tables for representative permalink structures and
//! assert on exact patterns, queries and relative positions, since the
//! table order is what routing semantics hang off.

use super::*;
use crate::config::SiteConfig;
use crate::store::{MemoryOptionStore, REWRITE_RULES_KEY};

fn date_name_engine() -> RuleEngine {
    RuleEngine::new("/%year%/%monthnum%/%postname%/", "index.php")
}

// ============================================================================
// Structure-derived state
// ============================================================================

#[test]
fn test_init_derives_front_and_flags() {
    let engine = date_name_engine();
    assert_eq!(engine.front(), "/");
    assert_eq!(engine.root(), "");
    assert!(engine.use_trailing_slashes());
    assert!(!engine.use_verbose_page_rules());
    assert!(engine.using_permalinks());
    assert!(!engine.using_index_permalinks());

    let engine = RuleEngine::new("/%postname%/", "index.php");
    assert!(engine.use_verbose_page_rules());

    let engine = RuleEngine::new("/blog/%author%/%postname%/", "index.php");
    assert_eq!(engine.front(), "/blog/");
    assert!(engine.use_verbose_page_rules());
}

#[test]
fn test_index_permalinks_set_root() {
    let mut engine = RuleEngine::new("/index.php/%postname%/", "index.php");
    assert!(engine.using_index_permalinks());
    assert_eq!(engine.root(), "index.php/");

    // Derived structures hang off the front-controller path.
    assert_eq!(
        engine.get_search_permastruct().unwrap(),
        "index.php/search/%search%"
    );
    let table = engine.rewrite_rules();
    assert!(table.contains("index.php/(.?.+?)(?:/([0-9]+))?/?$"));
}

#[test]
fn test_no_structure_means_no_rules() {
    let mut engine = RuleEngine::new("", "index.php");
    assert!(!engine.using_permalinks());
    assert!(engine.rewrite_rules().is_empty());
    assert!(engine.get_author_permastruct().is_none());
    assert!(engine.get_date_permastruct().is_none());
}

#[test]
fn test_set_permalink_structure_reinitializes() {
    let mut engine = date_name_engine();
    let date_before = engine.get_date_permastruct().unwrap();
    assert_eq!(date_before, "/%year%/%monthnum%/%day%");

    engine.set_permalink_structure("/%day%/%monthnum%/%year%/%postname%/");
    assert_eq!(
        engine.get_date_permastruct().unwrap(),
        "/%day%/%monthnum%/%year%"
    );
}

#[test]
fn test_date_structure_rebased_when_post_id_leads() {
    let mut engine = RuleEngine::new("/%post_id%/%postname%/", "index.php");
    // A leading numeric capture would swallow year archives.
    assert_eq!(
        engine.get_date_permastruct().unwrap(),
        "/date/%year%/%monthnum%/%day%"
    );
}

// ============================================================================
// Post family
// ============================================================================

#[test]
fn test_post_family_walk() {
    let mut engine = date_name_engine();
    let table = engine.rewrite_rules();

    // Entity level, with the closed paged form.
    assert_eq!(
        table.get("([0-9]{4})/([0-9]{1,2})/([^/]+)(?:/([0-9]+))?/?$"),
        Some(
            "index.php?year=$matches[1]&monthnum=$matches[2]&name=$matches[3]&page=$matches[4]"
        )
    );
    assert_eq!(
        table.get("([0-9]{4})/([0-9]{1,2})/([^/]+)/trackback/?$"),
        Some("index.php?year=$matches[1]&monthnum=$matches[2]&name=$matches[3]&tb=1")
    );
    assert_eq!(
        table.get("([0-9]{4})/([0-9]{1,2})/([^/]+)/feed/(feed|rdf|rss|rss2|atom)/?$"),
        Some(
            "index.php?year=$matches[1]&monthnum=$matches[2]&name=$matches[3]&feed=$matches[4]"
        )
    );

    // Archive levels close with an optional trailing slash.
    assert_eq!(
        table.get("([0-9]{4})/([0-9]{1,2})/?$"),
        Some("index.php?year=$matches[1]&monthnum=$matches[2]")
    );
    assert_eq!(table.get("([0-9]{4})/?$"), Some("index.php?year=$matches[1]"));

    // Deeper levels outrank shallower ones within one generated family.
    // In the merged table the month/year archive patterns keep their
    // earlier date-family positions, so the ordering is asserted on the
    // family's own output.
    let post = engine.generate_rewrite_rules(
        "/%year%/%monthnum%/%postname%/",
        &GenerateOpts::with_mask(EndpointMask::PERMALINK),
    );
    let entity = post
        .position("([0-9]{4})/([0-9]{1,2})/([^/]+)(?:/([0-9]+))?/?$")
        .unwrap();
    let month = post.position("([0-9]{4})/([0-9]{1,2})/?$").unwrap();
    let year = post.position("([0-9]{4})/?$").unwrap();
    assert!(entity < month);
    assert!(month < year);

    // The date family owns the archive patterns in the merged table and
    // keeps the same specificity order there.
    let day = table
        .position("([0-9]{4})/([0-9]{1,2})/([0-9]{1,2})/?$")
        .unwrap();
    let month = table.position("([0-9]{4})/([0-9]{1,2})/?$").unwrap();
    let year = table.position("([0-9]{4})/?$").unwrap();
    assert!(day < month);
    assert!(month < year);
}

#[test]
fn test_attachment_sub_rules_decapture_base() {
    let mut engine = RuleEngine::new("/%year%/%postname%/", "index.php");
    let table = engine.rewrite_rules();

    // The entity base loses its capture groups so the attachment slug is
    // always group 1.
    assert_eq!(
        table.get("[0-9]{4}/[^/]+/attachment/([^/]+)/?$"),
        Some("index.php?attachment=$matches[1]")
    );
    assert_eq!(
        table.get("[0-9]{4}/[^/]+/([^/]+)/trackback/?$"),
        Some("index.php?attachment=$matches[1]&tb=1")
    );
    assert_eq!(
        table.get("[0-9]{4}/[^/]+/([^/]+)/(feed|rdf|rss|rss2|atom)/?$"),
        Some("index.php?attachment=$matches[1]&feed=$matches[2]")
    );

    // Explicit attachment/ rules come before the bare sub-segment rules.
    let explicit = table.position("[0-9]{4}/[^/]+/attachment/([^/]+)/?$").unwrap();
    let bare = table.position("[0-9]{4}/[^/]+/([^/]+)/?$").unwrap();
    assert!(explicit < bare);
}

// ============================================================================
// Page family
// ============================================================================

#[test]
fn test_page_family_shape() {
    let mut engine = date_name_engine();
    let table = engine.page_rewrite_rules();

    assert_eq!(
        table.get("(.?.+?)(?:/([0-9]+))?/?$"),
        Some("index.php?pagename=$matches[1]&page=$matches[2]")
    );
    assert_eq!(
        table.get("(.?.+?)/comment-page-([0-9]{1,})/?$"),
        Some("index.php?pagename=$matches[1]&cpage=$matches[2]")
    );
    // Pages keep only the explicit attachment form; a bare sub-segment is
    // indistinguishable from a child page.
    assert!(table.contains(".?.+?/attachment/([^/]+)/?$"));
    assert!(!table.contains(".?.+?/([^/]+)/?$"));
}

#[test]
fn test_family_order_follows_verbose_page_flag() {
    // Date-fronted structure: posts can't collide with pages, posts first.
    let mut engine = date_name_engine();
    let table = engine.rewrite_rules();
    let post = table
        .position("([0-9]{4})/([0-9]{1,2})/([^/]+)(?:/([0-9]+))?/?$")
        .unwrap();
    let page = table.position("(.?.+?)(?:/([0-9]+))?/?$").unwrap();
    assert!(post < page);

    // Name-fronted structure: a one-segment URL is ambiguous, pages first.
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    let table = engine.rewrite_rules();
    let page = table.position("(.?.+?)(?:/([0-9]+))?/?$").unwrap();
    let post = table.position("([^/]+)(?:/([0-9]+))?/?$").unwrap();
    assert!(page < post);
}

// ============================================================================
// Fixed families
// ============================================================================

#[test]
fn test_root_comments_search_author_families() {
    let mut engine = date_name_engine();
    let table = engine.rewrite_rules();

    assert_eq!(
        table.get("feed/(feed|rdf|rss|rss2|atom)/?$"),
        Some("index.php?&feed=$matches[1]")
    );
    assert_eq!(
        table.get("page/?([0-9]{1,})/?$"),
        Some("index.php?&paged=$matches[1]")
    );
    assert_eq!(
        table.get("comments/feed/(feed|rdf|rss|rss2|atom)/?$"),
        Some("index.php?&feed=$matches[1]&withcomments=1")
    );
    assert_eq!(
        table.get("search/(.+)/?$"),
        Some("index.php?s=$matches[1]")
    );
    assert_eq!(
        table.get("search/(.+)/page/?([0-9]{1,})/?$"),
        Some("index.php?s=$matches[1]&paged=$matches[2]")
    );
    assert_eq!(
        table.get("author/([^/]+)/?$"),
        Some("index.php?author_name=$matches[1]")
    );

    // Comments are unpaged and don't walk.
    assert!(!table.contains("comments/page/?([0-9]{1,})/?$"));
}

#[test]
fn test_infrastructure_rules_at_root_mount() {
    let mut engine = date_name_engine();
    let table = engine.rewrite_rules();

    assert_eq!(table.get(r"robots\.txt$"), Some("index.php?robots=1"));
    assert_eq!(table.get(r"favicon\.ico$"), Some("index.php?favicon=1"));
    assert_eq!(
        table.get(r".*(atom|rdf|rss|rss2)\.xml$"),
        Some("index.php?feed=old")
    );

    // Infrastructure outranks every generated family.
    let robots = table.position(r"robots\.txt$").unwrap();
    let root_feed = table.position("feed/(feed|rdf|rss|rss2|atom)/?$").unwrap();
    assert!(robots < root_feed);

    // No signup rules unless registration pages are on.
    assert!(!table.contains("signup/?$"));
}

#[test]
fn test_subdirectory_mount_drops_robots_rules() {
    let mut config = SiteConfig::default();
    config.site.url = "http://example.com/blog".to_string();
    config.permalinks.structure = "/%year%/%postname%/".to_string();

    let mut engine = RuleEngine::from_config(&config);
    let table = engine.rewrite_rules();
    assert!(!table.contains(r"robots\.txt$"));
    assert!(!table.contains(r"favicon\.ico$"));
    // The legacy feed-file rule stays; it is path-relative.
    assert!(table.contains(r".*(atom|rdf|rss|rss2)\.xml$"));
}

#[test]
fn test_registration_pages_rules() {
    let mut config = SiteConfig::default();
    config.permalinks.structure = "/%postname%/".to_string();
    config.site.registration_pages = true;

    let mut engine = RuleEngine::from_config(&config);
    let table = engine.rewrite_rules();
    assert_eq!(table.get("signup/?$"), Some("index.php?signup=true"));
    assert_eq!(table.get("activate/?$"), Some("index.php?activate=true"));
}

#[test]
fn test_front_page_gets_root_comment_pagination() {
    let mut engine = date_name_engine();
    engine.page_on_front = Some(2);
    let table = engine.rewrite_rules();
    assert_eq!(
        table.get("comment-page-([0-9]{1,})/?$"),
        Some("index.php?&page_id=2&cpage=$matches[1]")
    );

    engine.page_on_front = None;
    let table = engine.rewrite_rules();
    assert!(!table.contains("comment-page-([0-9]{1,})/?$"));
}

// ============================================================================
// Endpoints
// ============================================================================

#[test]
fn test_endpoint_on_permalink_family() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    engine.add_rewrite_endpoint(
        EndpointMask::PERMALINK | EndpointMask::PAGES,
        "json",
        "json",
    );
    let table = engine.rewrite_rules();

    // Remainder is capture num_toks + 2 because of the optional group.
    assert_eq!(
        table.get("([^/]+)/json(/(.*))?/?$"),
        Some("index.php?name=$matches[1]&json=$matches[3]")
    );
    assert_eq!(
        table.get("(.?.+?)/json(/(.*))?/?$"),
        Some("index.php?pagename=$matches[1]&json=$matches[3]")
    );
    // Not registered for search.
    assert!(!table.contains("search/(.+)/json(/(.*))?/?$"));
}

#[test]
fn test_single_family_endpoint_isolation() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    engine.add_rewrite_endpoint(EndpointMask::PAGES, "json", "json");
    engine.add_rewrite_endpoint(EndpointMask::PERMALINK, "amp", "amp");
    let table = engine.rewrite_rules();

    // A pages-only endpoint never lands on post rules.
    assert!(table.contains("(.?.+?)/json(/(.*))?/?$"));
    assert!(!table.contains("([^/]+)/json(/(.*))?/?$"));

    // A permalink-only endpoint never lands on page rules.
    assert!(table.contains("([^/]+)/amp(/(.*))?/?$"));
    assert!(!table.contains("(.?.+?)/amp(/(.*))?/?$"));
}

#[test]
fn test_year_endpoint_attaches_inside_other_family() {
    let mut engine = date_name_engine();
    engine.add_rewrite_endpoint(EndpointMask::YEAR, "summary", "summary");
    let table = engine.rewrite_rules();

    // The %year% level of the post walk accepts the endpoint even though
    // the family mask is PERMALINK.
    assert_eq!(
        table.get("([0-9]{4})/summary(/(.*))?/?$"),
        Some("index.php?year=$matches[1]&summary=$matches[3]")
    );
}

#[test]
fn test_attachment_endpoint_backref() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    engine.add_rewrite_endpoint(EndpointMask::ATTACHMENT, "embed", "embed");
    let table = engine.rewrite_rules();
    assert_eq!(
        table.get("[^/]+/attachment/([^/]+)/embed(/(.*))?/?$"),
        Some("index.php?attachment=$matches[1]&embed=$matches[3]")
    );
}

// ============================================================================
// Custom permastructs and content types
// ============================================================================

#[test]
fn test_custom_permastruct_gets_front_prefix() {
    let mut engine = RuleEngine::new("/blog/%year%/%postname%/", "index.php");
    engine.add_rewrite_tag("%category%", "(.+?)", "category_name=");
    engine.add_permastruct(
        "category",
        Permastruct::new("category/%category%").ep_mask(EndpointMask::CATEGORIES),
    );
    let table = engine.rewrite_rules();

    assert_eq!(
        table.get("blog/category/(.+?)/?$"),
        Some("index.php?category_name=$matches[1]")
    );
    assert!(table.contains("blog/category/(.+?)/page/?([0-9]{1,})/?$"));

    // Custom structures outrank the built-in families.
    let category = table.position("blog/category/(.+?)/?$").unwrap();
    let author = table.position("blog/author/([^/]+)/?$").unwrap();
    assert!(category < author);
}

#[test]
fn test_custom_permastruct_without_front() {
    let mut engine = RuleEngine::new("/blog/%postname%/", "index.php");
    engine.add_rewrite_tag("%tag%", "([^/]+)", "tag=");
    engine.add_permastruct(
        "post_tag",
        Permastruct::new("topics/%tag%")
            .with_front(false)
            .ep_mask(EndpointMask::TAGS),
    );
    let table = engine.rewrite_rules();
    assert!(table.contains("topics/([^/]+)/?$"));
    assert!(!table.contains("blog/topics/([^/]+)/?$"));
}

#[test]
fn test_reregistering_permastruct_replaces() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    engine.add_rewrite_tag("%tag%", "([^/]+)", "tag=");
    engine.add_permastruct("post_tag", Permastruct::new("tag/%tag%"));
    engine.add_permastruct("post_tag", Permastruct::new("topics/%tag%"));
    let table = engine.rewrite_rules();
    assert!(table.contains("topics/([^/]+)/?$"));
    assert!(!table.contains("tag/([^/]+)/?$"));
}

#[test]
fn test_content_type_marks_single_entity() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    engine.add_content_type("product", false);
    engine.add_permastruct("product", Permastruct::new("product/%product%"));
    let table = engine.rewrite_rules();

    assert_eq!(
        table.get("product/([^/]+)(?:/([0-9]+))?/?$"),
        Some("index.php?product=$matches[1]&page=$matches[2]")
    );
    assert!(table.contains("product/([^/]+)/trackback/?$"));
}

#[test]
fn test_config_taxonomy_bases() {
    let mut config = SiteConfig::default();
    config.permalinks.structure = "/%postname%/".to_string();
    config.permalinks.category_base = "section".to_string();
    config.permalinks.tag_base = String::new();

    let mut engine = RuleEngine::from_config(&config);
    let table = engine.rewrite_rules();
    assert!(table.contains("section/(.+?)/?$"));
    assert!(!table.contains("tag/([^/]+)/?$"));
}

// ============================================================================
// Extra rules and transforms
// ============================================================================

#[test]
fn test_extra_rule_positions() {
    let mut engine = date_name_engine();
    engine.add_rule("healthz/?$", "index.php?healthz=1", RulePosition::Top);
    engine.add_rule("legacy/(.*)$", "index.php?legacy=$matches[1]", RulePosition::Bottom);
    let table = engine.rewrite_rules();

    assert_eq!(table.position("healthz/?$"), Some(0));
    assert_eq!(table.position("legacy/(.*)$"), Some(table.len() - 1));
}

#[test]
fn test_transform_rewrites_family() {
    let mut engine = date_name_engine();
    engine.add_transform("author", |table| {
        table
            .into_iter()
            .map(|rule| (rule.pattern, format!("{}&is_author=1", rule.query)))
            .collect::<RuleTable>()
    });
    let table = engine.rewrite_rules();
    assert_eq!(
        table.get("author/([^/]+)/?$"),
        Some("index.php?author_name=$matches[1]&is_author=1")
    );
    // Other families are untouched.
    assert_eq!(table.get("search/(.+)/?$"), Some("index.php?s=$matches[1]"));
}

// ============================================================================
// Stability and back-reference styles
// ============================================================================

#[test]
fn test_rewrite_rules_is_idempotent() {
    let mut engine = date_name_engine();
    let first = engine.rewrite_rules();
    let second = engine.rewrite_rules();
    assert_eq!(first, second);
}

#[test]
fn test_indexed_style_is_temporary() {
    let mut engine = RuleEngine::new("/%postname%/", "index.php");
    let indexed = engine.indexed_rewrite_rules();
    assert_eq!(
        indexed.get("([^/]+)(?:/([0-9]+))?/?$"),
        Some("index.php?name=$1&page=$2")
    );

    let matches = engine.rewrite_rules();
    assert_eq!(
        matches.get("([^/]+)(?:/([0-9]+))?/?$"),
        Some("index.php?name=$matches[1]&page=$matches[2]")
    );
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_flush_defers_and_coalesces_during_registration() {
    let mut engine = date_name_engine();
    let mut store = MemoryOptionStore::new();

    assert_eq!(engine.phase(), Phase::Registration);
    assert_eq!(engine.flush_rules(&mut store, FlushMode::Soft).unwrap(), None);
    assert_eq!(engine.flush_rules(&mut store, FlushMode::Hard).unwrap(), None);
    assert_eq!(engine.flush_rules(&mut store, FlushMode::Soft).unwrap(), None);
    assert!(store.get(REWRITE_RULES_KEY).is_none());

    // One coalesced flush, at the strongest requested mode.
    let executed = engine.complete_registration(&mut store).unwrap();
    assert_eq!(executed, Some(FlushMode::Hard));
    assert_eq!(engine.phase(), Phase::Routing);
    assert!(store.get(REWRITE_RULES_KEY).is_some());
}

#[test]
fn test_flush_runs_immediately_after_registration() {
    let mut engine = date_name_engine();
    let mut store = MemoryOptionStore::new();
    assert_eq!(engine.complete_registration(&mut store).unwrap(), None);

    let executed = engine.flush_rules(&mut store, FlushMode::Soft).unwrap();
    assert_eq!(executed, Some(FlushMode::Soft));
    assert!(store.get(REWRITE_RULES_KEY).is_some());
}

#[test]
fn test_rules_reads_through_cache() {
    let mut engine = date_name_engine();
    let mut store = MemoryOptionStore::new();
    let built = engine.rules(&mut store).unwrap();
    assert!(!built.is_empty());

    // A stale cache wins until flushed, even across structure changes.
    engine.set_permalink_structure("/%postname%/");
    let cached = engine.rules(&mut store).unwrap();
    assert_eq!(cached, built);

    engine.complete_registration(&mut store).unwrap();
    engine.flush_rules(&mut store, FlushMode::Soft).unwrap();
    let rebuilt = engine.rules(&mut store).unwrap();
    assert_ne!(rebuilt, built);
    assert!(rebuilt.contains("([^/]+)(?:/([0-9]+))?/?$"));
}
