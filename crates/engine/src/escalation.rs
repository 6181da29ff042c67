//! Escalation tracker — remembers the last known risk level so the alerting
//! collaborator can notify only when severity increases.
//!
//! The classifier is stateless per call; this is the one component holding
//! cross-evaluation state. State is in-memory and ephemeral: after a process
//! restart the tracker is empty and the first observation never escalates,
//! which errs on the quiet side.

use serde::Serialize;

use cycle_common::types::RiskLevel;

/// A strict increase in severity between two evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Escalation {
    /// Level before this observation.
    pub from: RiskLevel,
    /// Level that triggered the escalation.
    pub to: RiskLevel,
}

/// In-memory tracker of the last known risk level.
#[derive(Debug)]
pub struct EscalationTracker {
    last: Option<RiskLevel>,
}

impl EscalationTracker {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Last stored level, if any observation has been made.
    pub fn last(&self) -> Option<RiskLevel> {
        self.last
    }

    /// Record a classification and report whether severity increased.
    ///
    /// Always stores the new level. Returns `Some` only on a strict
    /// increase; first observations and de-escalations stay quiet.
    pub fn observe(&mut self, level: RiskLevel) -> Option<Escalation> {
        let previous = self.last.replace(level);
        match previous {
            Some(prev) if level > prev => {
                tracing::info!(from = %prev, to = %level, "Risk level escalated");
                Some(Escalation { from: prev, to: level })
            }
            Some(prev) => {
                if level < prev {
                    tracing::debug!(from = %prev, to = %level, "Risk level de-escalated");
                }
                None
            }
            None => None,
        }
    }

    /// Overwrite the stored level without an escalation check.
    pub fn store(&mut self, level: RiskLevel) {
        self.last = Some(level);
    }

    /// Forget the stored level.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for EscalationTracker {
    fn default() -> Self {
        Self::new()
    }
}
