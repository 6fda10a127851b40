//! The write path (spec Section 4.3). Writes are only ever buffered here;
//! they are applied to sites at commit, in `Engine::apply_commit`.

use std::collections::BTreeSet;

use repcrec_core::{AbortReason, ClusterTopology, SiteId, Time, Transaction, VarId};

use crate::sites::SiteRegistry;

/// What happened when a write was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was buffered.
    Ok,
    /// No site was up to receive it.
    Aborted(AbortReason),
}

/// Resolve `W(tid, var, value)` against the currently up sites.
pub fn write(var: VarId, value: i64, txn: &mut Transaction, sites: &SiteRegistry, now: Time) -> WriteOutcome {
    let targets: BTreeSet<SiteId> = if var.is_replicated() {
        sites
            .iter_ascending()
            .filter(|s| s.is_up())
            .map(|s| s.id())
            .collect()
    } else {
        let home = ClusterTopology::home_site(var);
        if sites.get(home).is_up() {
            let mut set = BTreeSet::new();
            set.insert(home);
            set
        } else {
            BTreeSet::new()
        }
    };

    if targets.is_empty() {
        return WriteOutcome::Aborted(AbortReason::NoSiteUpForWrite(var));
    }

    txn.record_write(var, value, &targets, now);
    WriteOutcome::Ok
}
