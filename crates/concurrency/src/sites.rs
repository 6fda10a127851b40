//! The fixed site registry.
//!
//! Owns all ten [`Site`]s and nothing else; it does not know about
//! transactions, versions, or the blocked-reads table. Read-gate
//! recomputation on recovery needs the version store, so that step lives
//! in `Engine::recover`, not here.

use std::collections::HashMap;

use repcrec_core::{ClusterTopology, Site, SiteId, Time, VarId};

/// The ten sites of the cluster, indexed by id.
#[derive(Debug)]
pub struct SiteRegistry {
    sites: HashMap<SiteId, Site>,
}

impl SiteRegistry {
    /// Build the registry at cluster genesis: every site up, holding the
    /// variables the fixed topology assigns it, at their initial values.
    pub fn genesis() -> Self {
        let mut sites = HashMap::new();
        for id in SiteId::all() {
            let mut data = HashMap::new();
            for var in VarId::all() {
                if ClusterTopology::initial_sites(var).contains(&id) {
                    data.insert(var, ClusterTopology::initial_value(var));
                }
            }
            sites.insert(id, Site::new(id, data));
        }
        SiteRegistry { sites }
    }

    /// Borrow a site by id.
    ///
    /// # Panics
    /// Panics if `id` is not one of the fixed ten sites, which cannot
    /// happen through the public `SiteId` constructor.
    pub fn get(&self, id: SiteId) -> &Site {
        self.sites.get(&id).expect("site registry covers every SiteId")
    }

    /// Mutably borrow a site by id.
    pub fn get_mut(&mut self, id: SiteId) -> &mut Site {
        self.sites.get_mut(&id).expect("site registry covers every SiteId")
    }

    /// All sites, in ascending id order (used by the dumper).
    pub fn iter_ascending(&self) -> impl Iterator<Item = &Site> {
        let mut ids: Vec<SiteId> = self.sites.keys().copied().collect();
        ids.sort_by_key(|s| s.index());
        ids.into_iter().map(move |id| self.get(id))
    }

    /// Mark `id` down at `now`. Returns whether it actually transitioned.
    pub fn fail(&mut self, id: SiteId, now: Time) -> bool {
        self.get_mut(id).fail(now)
    }
}
