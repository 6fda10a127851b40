//! The read path (spec Section 4.2).

use std::collections::BTreeSet;

use repcrec_core::{AbortReason, ClusterTopology, SiteId, Transaction, TxnId, VarId};

use crate::blocked::{BlockedRead, BlockedReads};
use crate::indexes::ReaderIndex;
use crate::sites::SiteRegistry;
use crate::store::VersionStore;

/// What happened when a read was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The read returned a value immediately.
    Ok(i64),
    /// The read was enqueued and will resolve on a future recovery.
    Blocked,
    /// The read aborted the transaction.
    Aborted(AbortReason),
}

/// Resolve `R(tid, var)` against the current snapshot and site state.
///
/// `txn` must belong to `tid` and be active; the caller (the engine)
/// checks preconditions (unknown tid, inactive tid, already-blocked tid)
/// before calling this.
pub fn read(
    tid: TxnId,
    var: VarId,
    txn: &mut Transaction,
    sites: &SiteRegistry,
    store: &VersionStore,
    blocked: &mut BlockedReads,
    readers: &mut ReaderIndex,
) -> ReadOutcome {
    if let Some(value) = txn.buffered_write(var) {
        txn.record_read(var);
        readers.record(var, tid);
        return ReadOutcome::Ok(value);
    }

    let snap = match store.snapshot_at_or_before(var, txn.start_time()) {
        Some(v) => v,
        None => return ReadOutcome::Aborted(AbortReason::NoCommittedVersion(var)),
    };

    if !var.is_replicated() {
        let home = ClusterTopology::home_site(var);
        let site = sites.get(home);
        if !site.is_up() {
            let mut eligible = BTreeSet::new();
            eligible.insert(home);
            blocked.insert(
                tid,
                BlockedRead {
                    var,
                    snapshot_value: snap.value(),
                    eligible,
                },
            );
            return ReadOutcome::Blocked;
        }
        if !snap.sites().contains(&home) {
            return ReadOutcome::Aborted(AbortReason::NoSnapshotAtHome(var, home));
        }
        txn.record_read(var);
        readers.record(var, tid);
        return ReadOutcome::Ok(snap.value());
    }

    let eligible: BTreeSet<SiteId> = snap
        .sites()
        .iter()
        .copied()
        .filter(|&s| sites.get(s).up_continuously(snap.commit_time(), txn.start_time()))
        .collect();
    if eligible.is_empty() {
        return ReadOutcome::Aborted(AbortReason::NoAvailableSnapshot(var));
    }

    let readable_now = eligible.iter().copied().find(|&s| {
        let site = sites.get(s);
        site.is_up() && site.may_read(var)
    });

    match readable_now {
        Some(_smallest_up_site) => {
            txn.record_read(var);
            readers.record(var, tid);
            ReadOutcome::Ok(snap.value())
        }
        None => {
            blocked.insert(
                tid,
                BlockedRead {
                    var,
                    snapshot_value: snap.value(),
                    eligible,
                },
            );
            ReadOutcome::Blocked
        }
    }
}
