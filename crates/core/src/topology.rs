//! The fixed cluster topology.
//!
//! Per spec Section 2, the cluster is always 10 sites and 20 variables with
//! a fixed placement rule; this is a Non-goal to generalize ("dynamic
//! topology"). Keeping the constants behind a named type still avoids
//! scattering magic numbers through the read/write paths.

use crate::time::Time;
use crate::types::{SiteId, VarId};

/// The fixed 10-site, 20-variable cluster layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterTopology;

impl ClusterTopology {
    /// Number of sites in the cluster.
    pub const SITE_COUNT: u8 = 10;

    /// Number of variables in the cluster.
    pub const VAR_COUNT: u8 = 20;

    /// The time at which the cluster initializes.
    pub const GENESIS: Time = Time::ZERO;

    /// The home site for a non-replicated (odd-indexed) variable:
    /// `home(i) = 1 + (i mod 10)`.
    pub fn home_site(var: VarId) -> SiteId {
        debug_assert!(!var.is_replicated(), "home_site is only defined for non-replicated variables");
        let home = 1 + (var.index() % Self::SITE_COUNT);
        SiteId::new(home).expect("home-site formula always yields a valid site id")
    }

    /// The initial committed value of a variable: `10 * i`.
    pub fn initial_value(var: VarId) -> i64 {
        10 * i64::from(var.index())
    }

    /// The sites a variable resides at, at cluster genesis: every site for
    /// a replicated variable, just the home site for a non-replicated one.
    pub fn initial_sites(var: VarId) -> Vec<SiteId> {
        if var.is_replicated() {
            SiteId::all().collect()
        } else {
            vec![Self::home_site(var)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_site_formula_matches_spec() {
        // home(1) = 1 + (1 mod 10) = 2
        assert_eq!(ClusterTopology::home_site(VarId::new(1).unwrap()).index(), 2);
        // home(11) = 1 + (11 mod 10) = 2
        assert_eq!(ClusterTopology::home_site(VarId::new(11).unwrap()).index(), 2);
        // home(19) = 1 + (19 mod 10) = 10
        assert_eq!(ClusterTopology::home_site(VarId::new(19).unwrap()).index(), 10);
    }

    #[test]
    fn initial_value_is_ten_times_index() {
        assert_eq!(ClusterTopology::initial_value(VarId::new(1).unwrap()), 10);
        assert_eq!(ClusterTopology::initial_value(VarId::new(20).unwrap()), 200);
    }

    #[test]
    fn replicated_variables_start_at_every_site() {
        let sites = ClusterTopology::initial_sites(VarId::new(2).unwrap());
        assert_eq!(sites.len(), 10);
    }

    #[test]
    fn non_replicated_variables_start_at_one_site() {
        let sites = ClusterTopology::initial_sites(VarId::new(1).unwrap());
        assert_eq!(sites, vec![ClusterTopology::home_site(VarId::new(1).unwrap())]);
    }
}
