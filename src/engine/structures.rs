//! Derived permalink structures.
//!
//! Each accessor composes the configured front/root prefix with a fixed
//! base segment and the relevant tag. Results are memoized until the next
//! `init()`; a disabled engine (no permalink structure) yields `None`.

use super::RuleEngine;

/// Memoized derived structures, cleared by `RuleEngine::init`.
#[derive(Debug, Clone, Default)]
pub(super) struct DerivedStructs {
    pub author: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
    pub search: Option<String>,
    pub feed: Option<String>,
    pub comment_feed: Option<String>,
}

/// Recognized date-tag orderings; first contiguous appearance wins.
const DATE_ENDIANS: &[&str] = &[
    "%year%/%monthnum%/%day%",
    "%day%/%monthnum%/%year%",
    "%monthnum%/%day%/%year%",
];

impl RuleEngine {
    /// Author archive structure, e.g. `author/%author%`.
    pub fn get_author_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.author.is_none() {
            self.derived.author = Some(format!("{}{}/%author%", self.front, self.author_base));
        }
        self.derived.author.clone()
    }

    /// Search structure, e.g. `search/%search%`.
    pub fn get_search_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.search.is_none() {
            self.derived.search = Some(format!("{}{}/%search%", self.root, self.search_base));
        }
        self.derived.search.clone()
    }

    /// Page structure. Pages hang off the site root, not the front prefix.
    pub fn get_page_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.page.is_none() {
            self.derived.page = Some(format!("{}%pagename%", self.root));
        }
        self.derived.page.clone()
    }

    /// Feed structure, e.g. `feed/%feed%`.
    pub fn get_feed_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.feed.is_none() {
            self.derived.feed = Some(format!("{}{}/%feed%", self.root, self.feed_base));
        }
        self.derived.feed.clone()
    }

    /// Comment feed structure, e.g. `comments/feed/%feed%`.
    pub fn get_comment_feed_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.comment_feed.is_none() {
            self.derived.comment_feed = Some(format!(
                "{}{}/{}/%feed%",
                self.root, self.comments_base, self.feed_base
            ));
        }
        self.derived.comment_feed.clone()
    }

    /// Date archive structure.
    ///
    /// The field ordering follows whichever of the three recognized
    /// endiannesses appears contiguously in the permalink structure,
    /// defaulting to year/month/day. When `%post_id%` sits within the
    /// first three tokens the date structure is rebased under a literal
    /// `date/` segment so numeric post IDs cannot shadow date archives.
    pub fn get_date_permastruct(&mut self) -> Option<String> {
        if !self.using_permalinks() {
            return None;
        }
        if self.derived.date.is_none() {
            let endian = DATE_ENDIANS
                .iter()
                .find(|endian| self.permalink_structure.contains(*endian))
                .copied()
                .unwrap_or(DATE_ENDIANS[0]);

            let mut front = self.front.clone();
            for (index, token) in self
                .tags
                .tokenize(&self.permalink_structure)
                .iter()
                .enumerate()
            {
                if *token == "%post_id%" && index < 3 {
                    front.push_str("date/");
                    break;
                }
            }

            self.derived.date = Some(format!("{front}{endian}"));
        }
        self.derived.date.clone()
    }

    /// Year archive structure: the date structure with month and day
    /// fields removed.
    pub fn get_year_permastruct(&mut self) -> Option<String> {
        let structure = self.get_date_permastruct()?;
        Some(collapse_slashes(
            &structure.replace("%monthnum%", "").replace("%day%", ""),
        ))
    }

    /// Month archive structure: the date structure with the day field
    /// removed.
    pub fn get_month_permastruct(&mut self) -> Option<String> {
        let structure = self.get_date_permastruct()?;
        Some(collapse_slashes(&structure.replace("%day%", "")))
    }

    /// Day archive structure; identical to the full date structure.
    pub fn get_day_permastruct(&mut self) -> Option<String> {
        self.get_date_permastruct()
    }
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}
