//! Permastructs - named permalink templates with generation options.

use super::endpoint::EndpointMask;

/// Per-structure rule-generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOpts {
    /// Endpoint mask applied to generated rules.
    pub ep_mask: EndpointMask,
    /// Add `/page/N/` pagination suffix rules.
    pub paged: bool,
    /// Add feed suffix rules.
    pub feed: bool,
    /// Feed rules address a comment feed (`withcomments=1`).
    pub for_comments: bool,
    /// Walk nested directory levels individually, one rule set per
    /// segment prefix.
    pub walk_dirs: bool,
    /// Apply registered endpoints.
    pub endpoints: bool,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            ep_mask: EndpointMask::NONE,
            paged: true,
            feed: true,
            for_comments: false,
            walk_dirs: true,
            endpoints: true,
        }
    }
}

impl GenerateOpts {
    pub fn with_mask(ep_mask: EndpointMask) -> Self {
        Self {
            ep_mask,
            ..Self::default()
        }
    }
}

/// A named permalink template registered on top of the built-in families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permastruct {
    /// Template with `%tag%` placeholders, without the site front prefix.
    pub structure: String,
    /// Prepend the site-wide front prefix at generation time.
    pub with_front: bool,
    pub opts: GenerateOpts,
}

impl Permastruct {
    pub fn new(structure: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            with_front: true,
            opts: GenerateOpts::default(),
        }
    }

    pub fn with_front(mut self, with_front: bool) -> Self {
        self.with_front = with_front;
        self
    }

    pub fn ep_mask(mut self, mask: EndpointMask) -> Self {
        self.opts.ep_mask = mask;
        self
    }

    pub fn opts(mut self, opts: GenerateOpts) -> Self {
        self.opts = opts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_builtin_families() {
        let opts = GenerateOpts::default();
        assert!(opts.paged && opts.feed && opts.walk_dirs && opts.endpoints);
        assert!(!opts.for_comments);
        assert!(opts.ep_mask.is_none());
    }

    #[test]
    fn test_builder() {
        let ps = Permastruct::new("category/%category%")
            .with_front(false)
            .ep_mask(EndpointMask::CATEGORIES);
        assert!(!ps.with_front);
        assert_eq!(ps.opts.ep_mask, EndpointMask::CATEGORIES);
    }
}
