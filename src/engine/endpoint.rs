//! Rewrite endpoints and their placement masks.
//!
//! An endpoint is an optional URL suffix (e.g. `/trackback/`) appended to
//! every rule family whose placement bit intersects the endpoint's mask.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of URL placements an endpoint may attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndpointMask(u32);

impl EndpointMask {
    pub const NONE: Self = Self(0);
    pub const PERMALINK: Self = Self(1);
    pub const ATTACHMENT: Self = Self(2);
    pub const DATE: Self = Self(4);
    pub const YEAR: Self = Self(8);
    pub const MONTH: Self = Self(16);
    pub const DAY: Self = Self(32);
    pub const ROOT: Self = Self(64);
    pub const COMMENTS: Self = Self(128);
    pub const SEARCH: Self = Self(256);
    pub const CATEGORIES: Self = Self(512);
    pub const TAGS: Self = Self(1024);
    pub const AUTHORS: Self = Self(2048);
    pub const PAGES: Self = Self(4096);

    pub const ALL_ARCHIVES: Self = Self(
        Self::DATE.0
            | Self::YEAR.0
            | Self::MONTH.0
            | Self::DAY.0
            | Self::CATEGORIES.0
            | Self::TAGS.0
            | Self::AUTHORS.0,
    );

    pub const ALL: Self = Self(
        Self::PERMALINK.0
            | Self::ATTACHMENT.0
            | Self::ROOT.0
            | Self::COMMENTS.0
            | Self::SEARCH.0
            | Self::PAGES.0
            | Self::ALL_ARCHIVES.0,
    );

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parse a placement name as used in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "none" => Self::NONE,
            "permalink" => Self::PERMALINK,
            "attachment" => Self::ATTACHMENT,
            "date" => Self::DATE,
            "year" => Self::YEAR,
            "month" => Self::MONTH,
            "day" => Self::DAY,
            "root" => Self::ROOT,
            "comments" => Self::COMMENTS,
            "search" => Self::SEARCH,
            "categories" => Self::CATEGORIES,
            "tags" => Self::TAGS,
            "authors" => Self::AUTHORS,
            "pages" => Self::PAGES,
            "all-archives" => Self::ALL_ARCHIVES,
            "all" => Self::ALL,
            _ => return None,
        })
    }
}

impl BitOr for EndpointMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EndpointMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EndpointMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// A registered endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Placement mask deciding which rule families get the suffix.
    pub mask: EndpointMask,
    /// URL segment, e.g. `trackback`.
    pub name: String,
    /// Query variable the captured remainder is assigned to.
    pub query_var: String,
}

impl Endpoint {
    pub fn new(mask: EndpointMask, name: impl Into<String>, query_var: impl Into<String>) -> Self {
        Self {
            mask,
            name: name.into(),
            query_var: query_var.into(),
        }
    }

    /// Suffix regex appended to a rule pattern: the endpoint segment with
    /// an optional captured remainder and optional trailing slash.
    pub fn suffix_regex(&self) -> String {
        format!("{}(/(.*))?/?$", self.name)
    }
}
