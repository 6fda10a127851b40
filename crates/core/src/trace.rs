//! Semantic trace events, decoupled from how they get printed.
//!
//! The engine never formats text. It emits [`TraceEvent`]s to whatever
//! [`TraceSink`] the caller wired up; `repcrec-cli` has the one that
//! actually renders spec Section 6's trace lines. Tests get a sink that
//! just collects events into a `Vec` and asserts on them directly, the
//! same separation the teacher draws between its `Storage` trait and the
//! formats layered on top of it.

use crate::error::AbortReason;
use crate::time::Time;
use crate::types::{SiteId, TxnId, VarId};

/// A single observable event in the transaction manager's execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A transaction began.
    Begin {
        /// The new transaction's id.
        tid: TxnId,
        /// The logical time it began at (its snapshot).
        start_time: Time,
    },

    /// A read succeeded, returning `value`.
    ReadOk {
        /// The reading transaction.
        tid: TxnId,
        /// The variable read.
        var: VarId,
        /// The value observed.
        value: i64,
    },

    /// A read could not be satisfied immediately and was enqueued to wait
    /// for a site to come up or come up far enough.
    ReadBlocked {
        /// The reading transaction.
        tid: TxnId,
        /// The variable it is waiting on.
        var: VarId,
    },

    /// A previously blocked read was resolved, returning `value`.
    ReadUnblocked {
        /// The reading transaction.
        tid: TxnId,
        /// The variable read.
        var: VarId,
        /// The frozen value it was waiting on.
        value: i64,
    },

    /// A write was accepted and buffered (not yet committed).
    WriteBuffered {
        /// The writing transaction.
        tid: TxnId,
        /// The variable written.
        var: VarId,
        /// The buffered value.
        value: i64,
    },

    /// An `end` command was issued for a transaction, before the commit
    /// gates run.
    EndRequested {
        /// The transaction being ended.
        tid: TxnId,
        /// The logical time of the `end` command.
        at: Time,
    },

    /// A transaction committed successfully.
    Committed {
        /// The committing transaction.
        tid: TxnId,
        /// The logical time of commit.
        commit_time: Time,
    },

    /// A transaction aborted.
    Aborted {
        /// The aborting transaction.
        tid: TxnId,
        /// Why it aborted.
        reason: AbortReason,
    },

    /// A site failed.
    SiteFailed {
        /// The site that went down.
        site: SiteId,
        /// The logical time of failure.
        at: Time,
    },

    /// A site recovered.
    SiteRecovered {
        /// The site that came back up.
        site: SiteId,
        /// The logical time of recovery.
        at: Time,
    },

    /// A snapshot dump of every site's currently held values, in site
    /// order, each site's variables in variable order.
    Dump {
        /// `(site, [(variable, value), ...])` for every site, site-ordered.
        sites: Vec<(SiteId, Vec<(VarId, i64)>)>,
    },

    /// A script line was malformed, or referenced a transaction that is
    /// unknown or no longer active. Recorded and the manager moves on;
    /// it never crashes the run (spec Section 7).
    UsageError {
        /// A human-readable description of what was wrong.
        message: String,
    },
}

/// Receives [`TraceEvent`]s as the engine produces them.
///
/// Implementors decide how (or whether) to render an event; the engine
/// itself holds only a `&mut dyn TraceSink` and knows nothing about text
/// formatting.
pub trait TraceSink {
    /// Record one event.
    fn emit(&mut self, event: TraceEvent);
}

/// A sink that discards every event. Useful as a default or in tests that
/// only care about the returned/observed state, not the trace.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

/// A sink that records every event in order, for tests that assert on the
/// exact trace produced.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<TraceEvent>,
}

impl RecordingSink {
    /// An empty recorder.
    pub fn new() -> Self {
        RecordingSink { events: Vec::new() }
    }

    /// The events recorded so far, in emission order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl TraceSink for RecordingSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
