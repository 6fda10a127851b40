//! The top-level transaction manager: clock, dispatch, and the glue
//! between the read/write paths, the three commit gates, the site
//! registry, and the blocked-reads unblocker.

use std::collections::{BTreeSet, HashMap};

use repcrec_core::{
    AbortReason, ClusterTopology, Error, Result, SiteId, Time, TraceEvent, TraceSink, Transaction, TransactionStatus, TxnId, VarId,
};
use tracing::{debug, info, warn};

use crate::blocked::BlockedReads;
use crate::conflict::gate_c_ssi_cycle;
use crate::indexes::{LastWriterIndex, ReaderIndex};
use crate::read::{self, ReadOutcome};
use crate::sites::SiteRegistry;
use crate::store::VersionStore;
use crate::validation::{gate_a_available_copies, gate_b_first_committer_wins};
use crate::write::{self, WriteOutcome};

/// The replicated transaction manager: owns every piece of mutable state
/// and drives the clock. One `Engine` corresponds to one `// Test` block
/// (spec Section 6): each starts fresh at time 0.
pub struct Engine {
    now: Time,
    txns: HashMap<TxnId, Transaction>,
    sites: SiteRegistry,
    store: VersionStore,
    blocked: BlockedReads,
    readers: ReaderIndex,
    last_writer: LastWriterIndex,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// A fresh engine at cluster genesis (time 0, every site up, every
    /// variable at its initial value).
    pub fn new() -> Self {
        Engine {
            now: ClusterTopology::GENESIS,
            txns: HashMap::new(),
            sites: SiteRegistry::genesis(),
            store: VersionStore::genesis(),
            blocked: BlockedReads::new(),
            readers: ReaderIndex::default(),
            last_writer: LastWriterIndex::default(),
        }
    }

    /// The current logical time.
    pub fn now(&self) -> Time {
        self.now
    }

    fn tick(&mut self) {
        self.now = self.now.tick();
    }

    /// `begin(T<k>)`. A no-op if `tid` is already active.
    pub fn begin(&mut self, tid: TxnId, sink: &mut dyn TraceSink) {
        self.tick();
        if self.txns.get(&tid).is_some_and(Transaction::is_active) {
            return;
        }
        debug!(%tid, now = %self.now, "begin");
        self.txns.insert(tid, Transaction::begin(tid, self.now));
        sink.emit(TraceEvent::Begin {
            tid,
            start_time: self.now,
        });
    }

    /// `R(T<k>, x<j>)`.
    pub fn read(&mut self, tid: TxnId, var: VarId, sink: &mut dyn TraceSink) -> Result<()> {
        self.tick();
        let active = self.active_transaction(tid)?;
        if !active {
            return Ok(());
        }
        if self.blocked.has_pending(tid) {
            return Ok(());
        }

        let txn = self.txns.get_mut(&tid).expect("checked active above");
        let outcome = read::read(tid, var, txn, &self.sites, &self.store, &mut self.blocked, &mut self.readers);
        match outcome {
            ReadOutcome::Ok(value) => sink.emit(TraceEvent::ReadOk { tid, var, value }),
            ReadOutcome::Blocked => sink.emit(TraceEvent::ReadBlocked { tid, var }),
            ReadOutcome::Aborted(reason) => self.abort(tid, reason, sink),
        }
        Ok(())
    }

    /// `W(T<k>, x<j>, v)`.
    pub fn write(&mut self, tid: TxnId, var: VarId, value: i64, sink: &mut dyn TraceSink) -> Result<()> {
        self.tick();
        let active = self.active_transaction(tid)?;
        if !active {
            return Ok(());
        }

        let now = self.now;
        let txn = self.txns.get_mut(&tid).expect("checked active above");
        match write::write(var, value, txn, &self.sites, now) {
            WriteOutcome::Ok => sink.emit(TraceEvent::WriteBuffered { tid, var, value }),
            WriteOutcome::Aborted(reason) => self.abort(tid, reason, sink),
        }
        Ok(())
    }

    /// `end(T<k>)`: run the three commit gates and, if all pass, apply
    /// every buffered write.
    pub fn end(&mut self, tid: TxnId, sink: &mut dyn TraceSink) -> Result<()> {
        self.tick();
        let active = self.active_transaction(tid)?;
        let now = self.now;
        sink.emit(TraceEvent::EndRequested { tid, at: now });
        if !active {
            // A re-issued end() on an already-terminated transaction is not
            // silent for the aborted case: it re-reports the abort, matching
            // the ground-truth runner's `end` handler.
            if let Some(TransactionStatus::Aborted { reason }) = self.txns.get(&tid).map(Transaction::status) {
                sink.emit(TraceEvent::Aborted { tid, reason: *reason });
            }
            return Ok(());
        }

        let txn = self.txns.get(&tid).expect("checked active above");
        if let Err(reason) = gate_a_available_copies(txn, &self.sites, now) {
            self.abort(tid, reason, sink);
            return Ok(());
        }
        if let Err(reason) = gate_b_first_committer_wins(tid, txn, &self.last_writer) {
            self.abort(tid, reason, sink);
            return Ok(());
        }
        if let Err(reason) = gate_c_ssi_cycle(tid, &self.txns, &self.readers, &self.store, now) {
            self.abort(tid, reason, sink);
            return Ok(());
        }

        self.apply_commit(tid, now);
        sink.emit(TraceEvent::Committed { tid, commit_time: now });
        Ok(())
    }

    fn apply_commit(&mut self, tid: TxnId, now: Time) {
        let writes: Vec<(VarId, i64)> = self
            .txns
            .get(&tid)
            .expect("tid validated by caller")
            .write_buffer()
            .collect();

        for (var, value) in writes {
            let targets = self
                .txns
                .get(&tid)
                .expect("tid validated by caller")
                .write_sites(var)
                .cloned()
                .unwrap_or_default();
            let mut applied: BTreeSet<SiteId> = BTreeSet::new();
            for site in targets {
                if self.sites.get(site).is_up() {
                    self.sites.get_mut(site).apply_write(var, value);
                    applied.insert(site);
                }
            }
            self.store.commit(var, value, now, tid, applied);
            self.last_writer.set(var, tid, now);
        }

        self.txns.get_mut(&tid).expect("tid validated by caller").mark_committed(now);
        info!(%tid, now = %now, "committed");
    }

    fn abort(&mut self, tid: TxnId, reason: AbortReason, sink: &mut dyn TraceSink) {
        warn!(%tid, %reason, "aborted");
        if let Some(txn) = self.txns.get_mut(&tid) {
            if txn.is_active() {
                txn.mark_aborted(reason);
            }
        }
        self.blocked.unblock(&mut self.txns, &self.sites, &mut self.readers, sink);
        sink.emit(TraceEvent::Aborted { tid, reason });
    }

    /// `fail(<site>)`.
    pub fn fail(&mut self, site: SiteId, sink: &mut dyn TraceSink) {
        self.tick();
        if self.sites.fail(site, self.now) {
            sink.emit(TraceEvent::SiteFailed { site, at: self.now });
        }
    }

    /// `recover(<site>)`. Recomputes the read gate for every variable the
    /// site holds (Invariant S2), then runs the unblocker.
    pub fn recover(&mut self, site: SiteId, sink: &mut dyn TraceSink) {
        self.tick();
        let now = self.now;
        let recovered = self.sites.get_mut(site).recover(now);
        if !recovered {
            return;
        }
        sink.emit(TraceEvent::SiteRecovered { site, at: now });

        let held: Vec<VarId> = self.sites.get(site).held_variables().into_iter().map(|(v, _)| v).collect();
        for var in held {
            let open = if var.is_replicated() {
                self.store.latest(var).sites().contains(&site)
            } else {
                true
            };
            self.sites.get_mut(site).set_read_gate(var, open);
        }

        self.blocked.unblock(&mut self.txns, &self.sites, &mut self.readers, sink);
    }

    /// `dump()`: every site's held variables and values, ascending.
    pub fn dump(&mut self, sink: &mut dyn TraceSink) {
        self.tick();
        let sites = self
            .sites
            .iter_ascending()
            .map(|s| (s.id(), s.held_variables()))
            .collect();
        sink.emit(TraceEvent::Dump { sites });
    }

    /// The current lifecycle status of `tid`, if it has ever begun.
    pub fn status_of(&self, tid: TxnId) -> Option<repcrec_core::TransactionStatus> {
        self.txns.get(&tid).map(|t| t.status().clone())
    }

    /// Whether `tid` currently has a pending blocked read.
    pub fn has_blocked_read(&self, tid: TxnId) -> bool {
        self.blocked.has_pending(tid)
    }

    /// The full version history of `var`, for tests and tooling that
    /// assert append-only/monotonic-commit-time invariants directly.
    pub fn history(&self, var: VarId) -> &repcrec_core::VersionHistory {
        self.store.history(var)
    }

    /// Whether `site` currently has its read gate open for `var`.
    pub fn may_read(&self, site: SiteId, var: VarId) -> bool {
        self.sites.get(site).may_read(var)
    }

    fn active_transaction(&self, tid: TxnId) -> Result<bool> {
        match self.txns.get(&tid) {
            Some(t) if t.is_active() => Ok(true),
            Some(_) => Ok(false),
            None => Err(Error::UnknownTransaction(tid)),
        }
    }
}
