//! Per-stage rule transforms.
//!
//! Each rule family ("stage") can carry an ordered list of transform
//! functions. The engine applies them right after generating that stage's
//! rules, before the family is merged into the final table. Registration
//! order is application order.

use rustc_hash::FxHashMap;

use super::rules::RuleTable;

/// A pluggable transform applied to one stage's freshly generated rules.
pub type RuleTransform = Box<dyn Fn(RuleTable) -> RuleTable + Send + Sync>;

/// Built-in stage names; custom permastructs use their registered name.
pub const STAGES: &[&str] = &[
    "post", "date", "root", "comments", "search", "author", "page",
];

#[derive(Default)]
pub struct TransformRegistry {
    stages: FxHashMap<String, Vec<RuleTransform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform for a stage. Unknown stage names are allowed:
    /// they address custom permastructs registered under that name.
    pub fn register<F>(&mut self, stage: &str, transform: F)
    where
        F: Fn(RuleTable) -> RuleTable + Send + Sync + 'static,
    {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .push(Box::new(transform));
    }

    /// Run every transform registered for `stage`, in registration order.
    pub fn apply(&self, stage: &str, table: RuleTable) -> RuleTable {
        match self.stages.get(stage) {
            Some(transforms) => transforms.iter().fold(table, |table, f| f(table)),
            None => table,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .stages
            .iter()
            .map(|(stage, fns)| (stage.as_str(), fns.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("TransformRegistry")
            .field("stages", &counts)
            .finish()
    }
}
