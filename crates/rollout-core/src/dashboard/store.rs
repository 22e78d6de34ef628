//! Dashboard state machine.
//!
//! Every refresh cycle is stamped with the mount epoch and a sequence number.
//! A result is applied only while its epoch is current and only if no newer
//! cycle has already landed, so a slow cycle can never overwrite a later
//! snapshot and nothing lands after a teardown.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{DashboardSnapshot, DashboardState};
use crate::demo;
use crate::source::SourceMode;

/// Views that must re-derive after a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// Metrics, error catalog, assessments, loading or error changed.
    pub dashboard: bool,
    /// Task list, loading or error changed.
    pub deployments: bool,
}

impl Invalidation {
    pub const NONE: Invalidation = Invalidation {
        dashboard: false,
        deployments: false,
    };

    pub const ALL: Invalidation = Invalidation {
        dashboard: true,
        deployments: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.dashboard && !self.deployments
    }

    fn between(before: &DashboardState, after: &DashboardState) -> Self {
        let status_changed = before.is_loading != after.is_loading
            || before.error_message != after.error_message;
        let old = before.snapshot.as_deref();
        let new = after.snapshot.as_deref();

        let tasks_changed = old.map(|s| &s.tasks) != new.map(|s| &s.tasks);
        let overview_changed = old.map(|s| (&s.metrics, &s.errors, &s.assessments))
            != new.map(|s| (&s.metrics, &s.errors, &s.assessments));

        Invalidation {
            dashboard: status_changed || overview_changed,
            deployments: status_changed || tasks_changed,
        }
    }
}

/// Identity of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTicket {
    epoch: u64,
    seq: u64,
}

impl CycleTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
pub struct DashboardStore {
    state: DashboardState,
    mode: Option<SourceMode>,
    epoch: u64,
    next_seq: u64,
    last_applied: Option<u64>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Active mode, `None` when unmounted.
    pub fn mode(&self) -> Option<SourceMode> {
        self.mode
    }

    /// Start a new session in `mode`, invalidating every outstanding cycle.
    ///
    /// Demo mode installs the fixed snapshot synchronously. Live mode starts
    /// from an empty, loading state; the caller issues the first cycle.
    pub fn mount(&mut self, mode: SourceMode) -> Invalidation {
        self.epoch += 1;
        self.last_applied = None;
        self.mode = Some(mode);
        debug!(epoch = self.epoch, %mode, "dashboard mounted");

        let next = match mode {
            SourceMode::Demo => DashboardState {
                snapshot: Some(Arc::new(demo::snapshot())),
                is_loading: false,
                error_message: None,
            },
            SourceMode::Live => DashboardState::default(),
        };
        self.replace(next)
    }

    /// Tear down the session; late results are discarded from now on.
    pub fn unmount(&mut self) {
        self.epoch += 1;
        self.mode = None;
        debug!(epoch = self.epoch, "dashboard unmounted");
    }

    /// Stamp a new refresh cycle. Only live sessions poll.
    pub fn begin_cycle(&mut self) -> Option<CycleTicket> {
        if self.mode != Some(SourceMode::Live) {
            return None;
        }
        self.next_seq += 1;
        Some(CycleTicket {
            epoch: self.epoch,
            seq: self.next_seq,
        })
    }

    /// Apply the outcome of a cycle.
    ///
    /// Returns `None` when the result is stale and was discarded.
    pub fn resolve(
        &mut self,
        ticket: CycleTicket,
        result: Result<DashboardSnapshot, String>,
    ) -> Option<Invalidation> {
        if ticket.epoch != self.epoch {
            debug!(seq = ticket.seq, "discarding cycle from a previous mount");
            return None;
        }
        if self.last_applied.is_some_and(|last| last >= ticket.seq) {
            debug!(seq = ticket.seq, "discarding superseded cycle");
            return None;
        }
        self.last_applied = Some(ticket.seq);

        let next = match result {
            Ok(snapshot) => DashboardState {
                snapshot: Some(Arc::new(snapshot)),
                is_loading: false,
                error_message: None,
            },
            Err(message) => {
                warn!(seq = ticket.seq, %message, "dashboard refresh failed");
                DashboardState {
                    snapshot: self.state.snapshot.clone(),
                    is_loading: false,
                    error_message: Some(message),
                }
            }
        };
        Some(self.replace(next))
    }

    fn replace(&mut self, next: DashboardState) -> Invalidation {
        let invalidation = Invalidation::between(&self.state, &next);
        self.state = next;
        invalidation
    }
}
