//! The reader index and last-writer index.
//!
//! Both are pure bookkeeping consulted by the commit validator (`readers`
//! feeds Gate C's RW edges, `last_writer` feeds Gate B) and never
//! pruned on abort, per spec Section 9's "readers set grows
//! monotonically" design note — Gate C already filters aborted
//! transactions out of the node set, so stale entries are harmless.

use std::collections::{BTreeSet, HashMap};

use repcrec_core::{Time, TxnId, VarId};

/// `readers[x]`: every transaction that has read `x`, including
/// read-your-own-write.
#[derive(Debug, Default)]
pub struct ReaderIndex {
    readers: HashMap<VarId, BTreeSet<TxnId>>,
}

impl ReaderIndex {
    /// Record that `tid` read `var`.
    pub fn record(&mut self, var: VarId, tid: TxnId) {
        self.readers.entry(var).or_default().insert(tid);
    }

    /// Every transaction that has read `var`, in ascending tid order.
    pub fn readers_of(&self, var: VarId) -> BTreeSet<TxnId> {
        self.readers.get(&var).cloned().unwrap_or_default()
    }
}

/// `last_writer[x] = (tid, commit_time)` of the most recent committer.
#[derive(Debug, Default)]
pub struct LastWriterIndex {
    last: HashMap<VarId, (TxnId, Time)>,
}

impl LastWriterIndex {
    /// The most recent committer of `var`, if any has committed.
    pub fn get(&self, var: VarId) -> Option<(TxnId, Time)> {
        self.last.get(&var).copied()
    }

    /// Record that `tid` committed a write to `var` at `commit_time`.
    pub fn set(&mut self, var: VarId, tid: TxnId, commit_time: Time) {
        self.last.insert(var, (tid, commit_time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_index_is_empty_for_variables_never_read() {
        let idx = ReaderIndex::default();
        assert!(idx.readers_of(VarId::new(1).unwrap()).is_empty());
    }

    #[test]
    fn last_writer_index_tracks_the_most_recent_set() {
        let mut idx = LastWriterIndex::default();
        let x1 = VarId::new(1).unwrap();
        idx.set(x1, TxnId::new(1), Time::new(3));
        idx.set(x1, TxnId::new(2), Time::new(7));
        assert_eq!(idx.get(x1), Some((TxnId::new(2), Time::new(7))));
    }
}
