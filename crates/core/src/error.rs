//! Error types for RepCRec.
//!
//! Per spec Section 7, there are exactly seven abort reasons, each tied to
//! a specific gate in the read path, write path, or commit validator. They
//! are represented as a closed enum rather than free-form strings so that
//! a `TraceSink` can match on the *kind* of abort to render the right line,
//! the same way the teacher's `CommitError` stays a closed enum instead of
//! collapsing into `anyhow::Error`.
//!
//! Usage errors (unknown transaction id, malformed script line) are a
//! separate, non-aborting error path: the manager records them and moves
//! on, it never panics or returns `Err` out of `Engine::dispatch`.

use thiserror::Error;

use crate::types::{SiteId, TxnId, VarId};

/// Result type alias for RepCRec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The seven abort reasons of spec Section 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// Read-time: no committed version of the variable exists at or before
    /// the transaction's start time.
    #[error("no committed version for {0}")]
    NoCommittedVersion(VarId),

    /// Read-time (non-replicated): the home site does not hold the chosen
    /// snapshot version.
    #[error("no snapshot for {0} at home site {1}")]
    NoSnapshotAtHome(VarId, SiteId),

    /// Read-time (replicated): no holding site had continuous uptime from
    /// the snapshot's commit time to the transaction's start time.
    #[error("no available snapshot for {0}")]
    NoAvailableSnapshot(VarId),

    /// Write-time: no site is currently up to receive the write.
    #[error("no site up for write to {0}")]
    NoSiteUpForWrite(VarId),

    /// Commit Gate A: a site this transaction wrote to failed after the
    /// write and before commit.
    #[error("site {0} failed after write")]
    SiteFailedAfterWrite(SiteId),

    /// Commit Gate B: another transaction committed a write to the same
    /// variable after this transaction started (first-committer-wins).
    #[error("first-committer-wins conflict on {0} with {1}")]
    FirstCommitterWins(VarId, TxnId),

    /// Commit Gate C: this transaction lies on an RW+WW conflict cycle.
    #[error("SSI cycle detected")]
    SsiCycle,
}

/// Errors for RepCRec.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric value was outside the fixed cluster's valid range.
    #[error("{what} {value} is out of range [{low}, {high}]")]
    OutOfRange {
        /// Human-readable name of the value being validated.
        what: &'static str,
        /// The value that failed validation.
        value: i64,
        /// Inclusive lower bound.
        low: i64,
        /// Inclusive upper bound.
        high: i64,
    },

    /// A script referenced a transaction id that was never begun (or that
    /// has already terminated and is being operated on again).
    #[error("unknown or inactive transaction {0}")]
    UnknownTransaction(TxnId),

    /// A script line did not match any of the seven command shapes.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// A method was called on a transaction in the wrong lifecycle state.
    #[error("transaction {0} is not active")]
    NotActive(TxnId),
}
