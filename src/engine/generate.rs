//! The structural walk that turns one permalink structure into rules.
//!
//! `generate_rewrite_rules` is the workhorse behind every rule family:
//! it splits the structure into a literal front and a tag-bearing
//! remainder, optionally walks the remainder one directory level at a
//! time, and emits per-level suffix rules (feeds, pagination, comment
//! pagination, endpoints) plus the permalink-specific families
//! (trackback, attachment sub-paths, the closed entity rule) whenever a
//! level pins down a single entity.

use super::RuleEngine;
use super::endpoint::EndpointMask;
use super::permastruct::GenerateOpts;
use super::rules::RuleTable;

const TRACKBACK_RE: &str = "trackback/?$";

impl RuleEngine {
    /// Generate the ordered rule set for one permalink structure.
    ///
    /// Deeper directory levels are prepended to the result, so `/2024/05/`
    /// rules are tried before `/2024/` rules.
    pub fn generate_rewrite_rules(&self, structure: &str, opts: &GenerateOpts) -> RuleTable {
        let feed_alt = format!("({})/?$", self.feeds.join("|"));
        let feed_full = format!("{}/{}", self.feed_base, feed_alt);
        let page_re = format!("{}/?([0-9]{{1,}})/?$", self.pagination_base);
        let comment_re = format!("{}-([0-9]{{1,}})/?$", self.comments_pagination_base);

        // Endpoint suffixes, resolved up front. Each carries its mask and
        // the `&var=` fragment appended to the query.
        let ep_suffixes: Vec<(String, EndpointMask, String)> = if opts.endpoints {
            self.endpoints
                .iter()
                .map(|ep| (ep.suffix_regex(), ep.mask, format!("&{}=", ep.query_var)))
                .collect()
        } else {
            Vec::new()
        };

        // Cumulative query strings: queries[i] covers the first i+1 tags.
        let tokens = self.tags.tokenize(structure);
        let mut queries: Vec<String> = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let mut q = if i > 0 {
                format!("{}&", queries[i - 1])
            } else {
                String::new()
            };
            q.push_str(self.tags.query_prefix(token));
            q.push_str(&self.backref.backref(i + 1));
            queries.push(q);
        }

        // Literal prefix before the first tag, and the remainder we walk.
        let front = &structure[..structure.find('%').unwrap_or(0)];
        let mut rest = structure.to_string();
        if !front.is_empty() && front != "/" {
            rest = rest.replace(front, "");
        }
        let rest = rest.trim_matches('/').to_string();
        let dirs: Vec<&str> = if opts.walk_dirs {
            rest.split('/').collect()
        } else {
            vec![rest.as_str()]
        };

        let mut table = RuleTable::new();
        let mut acc = front.trim_start_matches('/').to_string();

        for dir in &dirs {
            acc.push_str(dir);
            acc.push('/');
            acc = acc.trim_start_matches('/').to_string();

            let pattern = self.tags.substitute_regex(&acc);
            let num_toks = self.tags.tokenize(&acc).len();
            let query = if num_toks > 0 {
                queries[num_toks - 1].clone()
            } else {
                String::new()
            };

            // Year/month/day segments accept endpoints registered for
            // their specific placement even when the overall mask differs.
            let ep_mask_specific = match *dir {
                "%year%" => EndpointMask::YEAR,
                "%monthnum%" => EndpointMask::MONTH,
                "%day%" => EndpointMask::DAY,
                _ => EndpointMask::NONE,
            };

            let mut level = RuleTable::new();

            if opts.feed {
                let mut feed_query =
                    format!("{}?{}&feed={}", self.index, query, self.backref.backref(num_toks + 1));
                if opts.for_comments {
                    feed_query.push_str("&withcomments=1");
                }
                level.insert(format!("{pattern}{feed_full}"), feed_query.clone());
                level.insert(format!("{pattern}{feed_alt}"), feed_query);
            }

            if opts.paged {
                level.insert(
                    format!("{pattern}{page_re}"),
                    format!("{}?{}&paged={}", self.index, query, self.backref.backref(num_toks + 1)),
                );
            }

            // Comment pagination on entity and page rules; on root rules
            // only when the front page is itself a page.
            if opts
                .ep_mask
                .intersects(EndpointMask::PAGES | EndpointMask::PERMALINK)
            {
                level.insert(
                    format!("{pattern}{comment_re}"),
                    format!("{}?{}&cpage={}", self.index, query, self.backref.backref(num_toks + 1)),
                );
            } else if opts.ep_mask.intersects(EndpointMask::ROOT)
                && let Some(front_page) = self.page_on_front
            {
                level.insert(
                    format!("{pattern}{comment_re}"),
                    format!(
                        "{}?{}&page_id={}&cpage={}",
                        self.index,
                        query,
                        front_page,
                        self.backref.backref(num_toks + 1)
                    ),
                );
            }

            for (suffix, mask, append) in &ep_suffixes {
                if mask.intersects(opts.ep_mask | ep_mask_specific) {
                    level.insert(
                        format!("{pattern}{suffix}"),
                        format!(
                            "{}?{}{}{}",
                            self.index,
                            query,
                            append,
                            self.backref.backref(num_toks + 2)
                        ),
                    );
                }
            }

            if num_toks > 0 {
                let (is_post, is_page) = self.classify_level(&acc);
                let closed_pattern;
                let closed_query;

                if is_post {
                    let trackback_pattern = format!("{pattern}{TRACKBACK_RE}");
                    let trackback_query = format!("{}?{}&tb=1", self.index, query);

                    // Attachment sub-rules match under the entity path but
                    // select by attachment slug alone, so the base pattern
                    // is stripped of its capture parentheses: the slug
                    // becomes capture group 1.
                    let trimmed = pattern.trim_end_matches('/').to_string();
                    let sub_base: String =
                        trimmed.chars().filter(|c| *c != '(' && *c != ')').collect();
                    let sub1 = format!("{sub_base}/([^/]+)/");
                    let sub2 = format!("{sub_base}/attachment/([^/]+)/");
                    let sub_query = format!("{}?attachment={}", self.index, self.backref.backref(1));
                    let sub_tb_query = format!("{sub_query}&tb=1");
                    let sub_feed_query = format!("{sub_query}&feed={}", self.backref.backref(2));
                    let sub_comment_query =
                        format!("{sub_query}&cpage={}", self.backref.backref(2));

                    for (suffix, mask, append) in &ep_suffixes {
                        if mask.intersects(EndpointMask::ATTACHMENT) {
                            let ep_query =
                                format!("{sub_query}{append}{}", self.backref.backref(3));
                            level.insert(format!("{sub1}{suffix}"), ep_query.clone());
                            level.insert(format!("{sub2}{suffix}"), ep_query);
                        }
                    }

                    closed_pattern = format!("{trimmed}(?:/([0-9]+))?/?$");
                    closed_query = format!(
                        "{}?{}&page={}",
                        self.index,
                        query,
                        self.backref.backref(num_toks + 1)
                    );

                    level.insert(trackback_pattern, trackback_query);

                    // Hierarchical pages keep only the explicit
                    // `attachment/<name>` form; a bare sub-segment would be
                    // indistinguishable from a child page.
                    if !is_page {
                        level.insert(format!("{sub1}?$"), sub_query.clone());
                        level.insert(format!("{sub1}{TRACKBACK_RE}"), sub_tb_query.clone());
                        level.insert(format!("{sub1}{feed_full}"), sub_feed_query.clone());
                        level.insert(format!("{sub1}{feed_alt}"), sub_feed_query.clone());
                        level.insert(format!("{sub1}{comment_re}"), sub_comment_query.clone());
                    }

                    let mut attachment_rules = RuleTable::new();
                    attachment_rules.insert(format!("{sub2}?$"), sub_query);
                    attachment_rules.insert(format!("{sub2}{TRACKBACK_RE}"), sub_tb_query);
                    attachment_rules.insert(format!("{sub2}{feed_full}"), sub_feed_query.clone());
                    attachment_rules.insert(format!("{sub2}{feed_alt}"), sub_feed_query);
                    attachment_rules.insert(format!("{sub2}{comment_re}"), sub_comment_query);
                    level = attachment_rules.merged_with(level);
                } else {
                    // Archive level: the trailing slash is optional.
                    closed_pattern = format!("{pattern}?$");
                    closed_query = format!("{}?{}", self.index, query);
                }

                level.insert(closed_pattern, closed_query);
            }

            // Deeper levels first.
            table = level.merged_with(table);
        }

        table
    }

    /// Does this cumulative level pin down a single entity, and is that
    /// entity a hierarchical page?
    fn classify_level(&self, acc: &str) -> (bool, bool) {
        let full_date = ["%year%", "%monthnum%", "%day%", "%hour%", "%minute%", "%second%"]
            .iter()
            .all(|tag| acc.contains(tag));
        let mut is_post = acc.contains("%postname%")
            || acc.contains("%post_id%")
            || acc.contains("%pagename%")
            || full_date;
        let mut is_page = acc.contains("%pagename%");

        if !is_post {
            for ct in &self.content_types {
                if acc.contains(&format!("%{}%", ct.name)) {
                    is_post = true;
                    is_page = ct.hierarchical;
                    break;
                }
            }
        }
        (is_post, is_page)
    }
}
