//! The blocked-reads table and the recovery unblocker.
//!
//! Per spec Section 9's "Blocked reads hold frozen data" design note: a
//! [`BlockedRead`] carries the snapshot value and eligible-site set
//! exactly as observed at read time and never recomputes either on
//! unblock.

use std::collections::{BTreeSet, HashMap};

use repcrec_core::{SiteId, TraceEvent, TraceSink, Transaction, TxnId, VarId};

use crate::indexes::ReaderIndex;
use crate::sites::SiteRegistry;

/// A read that could not be satisfied immediately.
#[derive(Debug, Clone)]
pub struct BlockedRead {
    /// The variable being read.
    pub var: VarId,
    /// The snapshot value frozen at read time.
    pub snapshot_value: i64,
    /// Sites whose recovery would satisfy this read.
    pub eligible: BTreeSet<SiteId>,
}

/// One pending read per waiting transaction.
#[derive(Debug, Default)]
pub struct BlockedReads {
    pending: HashMap<TxnId, BlockedRead>,
}

impl BlockedReads {
    /// An empty table.
    pub fn new() -> Self {
        BlockedReads::default()
    }

    /// Whether `tid` already has a pending read.
    pub fn has_pending(&self, tid: TxnId) -> bool {
        self.pending.contains_key(&tid)
    }

    /// Enqueue a blocked read for `tid`. A transaction holds at most one.
    pub fn insert(&mut self, tid: TxnId, read: BlockedRead) {
        self.pending.insert(tid, read);
    }

    /// Resolve every pending read whose eligible-site set now has an up
    /// site, in ascending tid order (spec Section 5's determinism
    /// guarantee), dropping any whose transaction is no longer active.
    pub fn unblock(
        &mut self,
        txns: &mut HashMap<TxnId, Transaction>,
        sites: &SiteRegistry,
        readers: &mut ReaderIndex,
        sink: &mut dyn TraceSink,
    ) {
        let mut ordered: Vec<TxnId> = self.pending.keys().copied().collect();
        ordered.sort_by_key(|t| t.value());

        for tid in ordered {
            let still_active = txns.get(&tid).map_or(false, Transaction::is_active);
            if !still_active {
                self.pending.remove(&tid);
                continue;
            }
            let satisfied = {
                let read = self.pending.get(&tid).expect("tid came from pending keys");
                read.eligible.iter().any(|&s| sites.get(s).is_up())
            };
            if !satisfied {
                continue;
            }
            let read = self.pending.remove(&tid).expect("checked present above");
            let txn = txns.get_mut(&tid).expect("checked active above");
            txn.record_read(read.var);
            readers.record(read.var, tid);
            sink.emit(TraceEvent::ReadUnblocked {
                tid,
                var: read.var,
                value: read.snapshot_value,
            });
        }
    }
}
