//! The transaction table record.
//!
//! A [`Transaction`] tracks everything the commit validator needs: buffered
//! writes, which sites each write targeted, the earliest time this
//! transaction wrote to each site (for Gate A), and the set of variables it
//! has read (for Gate C's reader index, which lives one level up in
//! `repcrec-concurrency` since it is keyed by variable, not by
//! transaction).

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::AbortReason;
use crate::time::Time;
use crate::types::{SiteId, TxnId, VarId};

/// A transaction's lifecycle state.
///
/// Per Invariant T1, transitions only go `Active -> Committed` or
/// `Active -> Aborted`, never back; `TransactionStatus` itself does not
/// enforce this (it is a plain data enum), the owning `Engine` does, by
/// construction of its dispatch logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Executing; can read and buffer writes.
    Active,
    /// Committed successfully at a recorded commit time.
    Committed,
    /// Aborted for the given reason.
    Aborted {
        /// Why the transaction aborted.
        reason: AbortReason,
    },
}

/// A transaction's buffered state, from `begin` through `end`.
#[derive(Debug, Clone)]
pub struct Transaction {
    tid: TxnId,
    start_time: Time,
    status: TransactionStatus,
    read_vars: HashSet<VarId>,
    write_buffer: HashMap<VarId, i64>,
    write_sites: HashMap<VarId, BTreeSet<SiteId>>,
    site_write_times: HashMap<SiteId, Time>,
    commit_time: Option<Time>,
}

impl Transaction {
    /// Begin a new transaction at the given logical time.
    pub fn begin(tid: TxnId, start_time: Time) -> Self {
        Transaction {
            tid,
            start_time,
            status: TransactionStatus::Active,
            read_vars: HashSet::new(),
            write_buffer: HashMap::new(),
            write_sites: HashMap::new(),
            site_write_times: HashMap::new(),
            commit_time: None,
        }
    }

    /// This transaction's id.
    pub fn tid(&self) -> TxnId {
        self.tid
    }

    /// The time this transaction began (and the snapshot version it reads).
    pub fn start_time(&self) -> Time {
        self.start_time
    }

    /// The current lifecycle state.
    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    /// Whether the transaction is still active.
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// The commit time, if committed.
    pub fn commit_time(&self) -> Option<Time> {
        self.commit_time
    }

    /// The value this transaction has buffered for `var`, if any
    /// (read-your-own-write source).
    pub fn buffered_write(&self, var: VarId) -> Option<i64> {
        self.write_buffer.get(&var).copied()
    }

    /// All buffered writes, `(variable, value)`.
    pub fn write_buffer(&self) -> impl Iterator<Item = (VarId, i64)> + '_ {
        self.write_buffer.iter().map(|(&v, &val)| (v, val))
    }

    /// Whether this transaction has buffered any write at all.
    pub fn has_writes(&self) -> bool {
        !self.write_buffer.is_empty()
    }

    /// The set of sites a write to `var` within this transaction has
    /// targeted so far (Invariant T3: accumulates across repeated writes).
    pub fn write_sites(&self, var: VarId) -> Option<&BTreeSet<SiteId>> {
        self.write_sites.get(&var)
    }

    /// Every `(site, earliest write time)` pair recorded for this
    /// transaction, used by Gate A.
    pub fn site_write_times(&self) -> impl Iterator<Item = (SiteId, Time)> + '_ {
        self.site_write_times.iter().map(|(&s, &t)| (s, t))
    }

    /// The variables this transaction has read (including RYOW reads).
    pub fn read_vars(&self) -> &HashSet<VarId> {
        &self.read_vars
    }

    /// Record that this transaction read `var` (success path of the read
    /// path, including read-your-own-write).
    pub fn record_read(&mut self, var: VarId) {
        self.read_vars.insert(var);
    }

    /// Record a buffered write and its targets (spec Section 4.3, steps
    /// 3-5): last-write-wins on the value, union on the target-site set,
    /// min-so-far on each target's earliest write time.
    pub fn record_write(&mut self, var: VarId, value: i64, targets: &BTreeSet<SiteId>, now: Time) {
        self.write_buffer.insert(var, value);
        self.write_sites
            .entry(var)
            .or_default()
            .extend(targets.iter().copied());
        for &site in targets {
            self.site_write_times
                .entry(site)
                .and_modify(|t| *t = (*t).min(now))
                .or_insert(now);
        }
    }

    /// Transition to `Committed` at the given time.
    pub fn mark_committed(&mut self, now: Time) {
        debug_assert!(self.is_active(), "commit only applies from Active");
        self.status = TransactionStatus::Committed;
        self.commit_time = Some(now);
    }

    /// Transition to `Aborted` with the given reason.
    pub fn mark_aborted(&mut self, reason: AbortReason) {
        debug_assert!(self.is_active(), "abort only applies from Active");
        self.status = TransactionStatus::Aborted { reason };
    }

    /// The `[start, end]` interval used by Gate C's RW-edge overlap test:
    /// `commit_time` if committed, `now` otherwise (covers both the
    /// candidate transaction mid-commit and any other still-active
    /// transaction that happens to be a reader).
    pub fn interval(&self, now: Time) -> (Time, Time) {
        (self.start_time, self.commit_time.unwrap_or(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(i: u8) -> VarId {
        VarId::new(i).unwrap()
    }
    fn site(i: u8) -> SiteId {
        SiteId::new(i).unwrap()
    }

    #[test]
    fn record_write_unions_target_sites_across_repeated_writes() {
        let mut t = Transaction::begin(TxnId::new(1), Time::ZERO);
        let mut targets_a = BTreeSet::new();
        targets_a.insert(site(1));
        t.record_write(var(2), 10, &targets_a, Time::new(1));

        let mut targets_b = BTreeSet::new();
        targets_b.insert(site(3));
        t.record_write(var(2), 20, &targets_b, Time::new(2));

        let sites = t.write_sites(var(2)).unwrap();
        assert!(sites.contains(&site(1)));
        assert!(sites.contains(&site(3)));
        assert_eq!(t.buffered_write(var(2)), Some(20), "last write wins");
    }

    #[test]
    fn site_write_times_record_the_earliest_time_per_site() {
        let mut t = Transaction::begin(TxnId::new(1), Time::ZERO);
        let mut targets = BTreeSet::new();
        targets.insert(site(1));
        t.record_write(var(2), 10, &targets, Time::new(5));
        t.record_write(var(2), 11, &targets, Time::new(2));

        let times: HashMap<_, _> = t.site_write_times().collect();
        assert_eq!(times.get(&site(1)), Some(&Time::new(2)));
    }

    #[test]
    fn interval_uses_commit_time_when_committed_and_now_otherwise() {
        let mut t = Transaction::begin(TxnId::new(1), Time::new(3));
        assert_eq!(t.interval(Time::new(10)), (Time::new(3), Time::new(10)));
        t.mark_committed(Time::new(7));
        assert_eq!(t.interval(Time::new(10)), (Time::new(3), Time::new(7)));
    }
}
