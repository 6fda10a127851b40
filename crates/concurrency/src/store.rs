//! The multi-version store: one append-only history per variable.

use std::collections::{BTreeSet, HashMap};

use repcrec_core::{ClusterTopology, SiteId, Time, TxnId, VarId, Version, VersionHistory};

/// Per-variable version histories for all twenty variables.
#[derive(Debug)]
pub struct VersionStore {
    histories: HashMap<VarId, VersionHistory>,
}

impl VersionStore {
    /// Build the store at cluster genesis: one committed version per
    /// variable, value `10 * index`, committed at time 0 by no writer,
    /// held at every site the fixed topology assigns it.
    pub fn genesis() -> Self {
        let mut histories = HashMap::new();
        for var in VarId::all() {
            let sites: BTreeSet<SiteId> = ClusterTopology::initial_sites(var).into_iter().collect();
            let mut history = VersionHistory::new();
            history.append(Version::new(
                ClusterTopology::initial_value(var),
                ClusterTopology::GENESIS,
                None,
                sites,
            ));
            histories.insert(var, history);
        }
        VersionStore { histories }
    }

    /// Borrow a variable's history.
    ///
    /// # Panics
    /// Panics if `var` is not one of the fixed twenty variables, which
    /// cannot happen through the public `VarId` constructor.
    pub fn history(&self, var: VarId) -> &VersionHistory {
        self.histories.get(&var).expect("version store covers every VarId")
    }

    /// The latest version of `var` with `commit_time <= at`.
    pub fn snapshot_at_or_before(&self, var: VarId, at: Time) -> Option<&Version> {
        self.history(var).latest_at_or_before(at)
    }

    /// The current (most recently committed) version of `var`.
    pub fn latest(&self, var: VarId) -> &Version {
        self.history(var)
            .latest()
            .expect("every variable has at least its genesis version")
    }

    /// Append a newly committed version of `var`.
    pub fn commit(&mut self, var: VarId, value: i64, now: Time, writer: TxnId, sites: BTreeSet<SiteId>) {
        self.histories
            .get_mut(&var)
            .expect("version store covers every VarId")
            .append(Version::new(value, now, Some(writer), sites));
    }
}
