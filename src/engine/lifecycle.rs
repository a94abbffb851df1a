//! Two-phase engine lifecycle and deferred rule flushing.
//!
//! Tags, endpoints, permastructs and transforms are registered during the
//! `Registration` phase. A flush requested before registration completes
//! is only recorded; `complete_registration` drains the record and runs
//! exactly one coalesced flush, using the strongest requested mode.

use anyhow::Result;

use super::RuleEngine;
use crate::debug;
use crate::store::{OptionStore, REWRITE_RULES_KEY};

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Bootstrap code may still register tags/endpoints/permastructs;
    /// flush requests are deferred.
    #[default]
    Registration,
    /// All registrations are in; flushes execute immediately.
    Routing,
}

/// Flush strength. `Hard` additionally signals that server configs should
/// be re-rendered by the caller; both drop and rebuild the cached table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlushMode {
    Soft,
    Hard,
}

impl RuleEngine {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drop the persisted rule table and rebuild it.
    ///
    /// During the registration phase the request is recorded and coalesced
    /// with earlier ones (a later `Hard` upgrades an earlier `Soft`); the
    /// single resulting flush runs when `complete_registration` fires.
    /// Returns the mode that was executed, or `None` when deferred.
    pub fn flush_rules(
        &mut self,
        store: &mut dyn OptionStore,
        mode: FlushMode,
    ) -> Result<Option<FlushMode>> {
        if self.phase == Phase::Registration {
            let coalesced = match self.pending_flush {
                Some(pending) => pending.max(mode),
                None => mode,
            };
            self.pending_flush = Some(coalesced);
            debug!("flush"; "deferred until registration completes (mode: {:?})", coalesced);
            return Ok(None);
        }
        self.do_flush(store, mode).map(Some)
    }

    /// Enter the routing phase, executing at most one coalesced flush.
    pub fn complete_registration(
        &mut self,
        store: &mut dyn OptionStore,
    ) -> Result<Option<FlushMode>> {
        self.phase = Phase::Routing;
        match self.pending_flush.take() {
            Some(mode) => self.do_flush(store, mode).map(Some),
            None => Ok(None),
        }
    }

    fn do_flush(&mut self, store: &mut dyn OptionStore, mode: FlushMode) -> Result<FlushMode> {
        store.delete(REWRITE_RULES_KEY)?;
        let table = self.rules(store)?;
        debug!("flush"; "rebuilt {} rules ({:?})", table.len(), mode);
        Ok(mode)
    }
}
