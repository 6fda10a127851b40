//! The multi-version store's per-variable history.
//!
//! A [`Version`] is immutable once constructed (Invariant V1/V2 of spec
//! Section 3): it is never mutated after being appended to a
//! [`VersionHistory`], only read. Histories are append-only; a new
//! `Version` is appended only at commit (spec Section 4.4).

use std::collections::BTreeSet;

use crate::time::Time;
use crate::types::{SiteId, TxnId};

/// An immutable committed version of a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    value: i64,
    commit_time: Time,
    writer: Option<TxnId>,
    sites: BTreeSet<SiteId>,
}

impl Version {
    /// Construct a new version. `writer` is `None` only for the genesis
    /// version created at cluster startup.
    pub fn new(value: i64, commit_time: Time, writer: Option<TxnId>, sites: BTreeSet<SiteId>) -> Self {
        Version {
            value,
            commit_time,
            writer,
            sites,
        }
    }

    /// The committed value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The time this version was committed.
    pub fn commit_time(&self) -> Time {
        self.commit_time
    }

    /// The transaction that wrote this version, or `None` for the genesis
    /// version.
    pub fn writer(&self) -> Option<TxnId> {
        self.writer
    }

    /// The sites that physically hold this version.
    pub fn sites(&self) -> &BTreeSet<SiteId> {
        &self.sites
    }
}

/// The append-only version history of a single variable.
#[derive(Debug, Clone, Default)]
pub struct VersionHistory {
    versions: Vec<Version>,
}

impl VersionHistory {
    /// An empty history (no versions yet).
    pub fn new() -> Self {
        VersionHistory { versions: Vec::new() }
    }

    /// Append a new version. The caller is responsible for the Invariant V2
    /// ordering guarantee (commit times non-decreasing by append order);
    /// this is upheld by construction since the engine only ever commits at
    /// the current logical time, which only moves forward.
    pub fn append(&mut self, version: Version) {
        debug_assert!(
            self.versions
                .last()
                .map_or(true, |last| last.commit_time <= version.commit_time),
            "version history commit times must be non-decreasing"
        );
        self.versions.push(version);
    }

    /// The latest version with `commit_time <= at`, i.e. the snapshot a
    /// transaction starting at `at` would observe. `None` if no version
    /// had committed by that time.
    pub fn latest_at_or_before(&self, at: Time) -> Option<&Version> {
        self.versions
            .iter()
            .filter(|v| v.commit_time <= at)
            .max_by_key(|v| v.commit_time)
    }

    /// The most recently appended version, i.e. the current value.
    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    /// All versions in append order, each tagged with its writer and
    /// commit time — used by Gate C's WW-edge construction.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(value: i64, commit_time: i64, writer: Option<u64>) -> Version {
        Version::new(
            value,
            Time::new(commit_time),
            writer.map(TxnId::new),
            BTreeSet::new(),
        )
    }

    #[test]
    fn latest_at_or_before_picks_the_newest_not_exceeding_the_bound() {
        let mut h = VersionHistory::new();
        h.append(v(10, 0, None));
        h.append(v(20, 5, Some(1)));
        h.append(v(30, 10, Some(2)));

        assert_eq!(h.latest_at_or_before(Time::new(4)).unwrap().value(), 10);
        assert_eq!(h.latest_at_or_before(Time::new(5)).unwrap().value(), 20);
        assert_eq!(h.latest_at_or_before(Time::new(7)).unwrap().value(), 20);
        assert_eq!(h.latest_at_or_before(Time::new(10)).unwrap().value(), 30);
    }

    #[test]
    fn latest_at_or_before_returns_none_when_nothing_had_committed_yet() {
        let mut h = VersionHistory::new();
        h.append(v(10, 5, None));
        assert!(h.latest_at_or_before(Time::new(4)).is_none());
    }

    #[test]
    fn history_is_append_only_and_versions_stay_immutable() {
        let mut h = VersionHistory::new();
        h.append(v(10, 0, None));
        let first = h.iter().next().unwrap().clone();
        h.append(v(20, 1, Some(1)));
        assert_eq!(h.iter().next().unwrap(), &first);
        assert_eq!(h.iter().count(), 2);
    }

    proptest::proptest! {
        /// P1/P2: for any non-decreasing sequence of commit times appended
        /// in order, the history stays append-only (earlier entries never
        /// change once a later one is appended) and commit times never
        /// decrease.
        #[test]
        fn p1_p2_append_only_history_keeps_earlier_entries_and_monotonic_times(
            gaps in proptest::collection::vec(0i64..5, 1..20),
        ) {
            let mut h = VersionHistory::new();
            let mut t = 0i64;
            let mut snapshots: Vec<Version> = Vec::new();
            for (n, gap) in gaps.iter().enumerate() {
                t += gap;
                h.append(v(n as i64, t, Some(n as u64)));
                snapshots.push(h.iter().nth(n).unwrap().clone());

                proptest::prop_assert_eq!(h.iter().count(), n + 1);
                for (i, snap) in snapshots.iter().enumerate() {
                    proptest::prop_assert_eq!(h.iter().nth(i).unwrap(), snap);
                }
                let times: Vec<Time> = h.iter().map(Version::commit_time).collect();
                proptest::prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }
}
