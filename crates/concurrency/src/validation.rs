//! Commit validator gates A and B (spec Section 4.4). Gate C (SSI cycle
//! detection) is large enough to warrant its own module; see
//! `conflict.rs`.

use repcrec_core::{AbortReason, Time, Transaction, TxnId};

use crate::indexes::LastWriterIndex;
use crate::sites::SiteRegistry;

/// Gate A — Available-copies rule: abort if any site this transaction
/// wrote to failed strictly after that write and at or before `now`.
pub fn gate_a_available_copies(txn: &Transaction, sites: &SiteRegistry, now: Time) -> Result<(), AbortReason> {
    for (site, first_write_time) in txn.site_write_times() {
        let failed_after_write = sites
            .get(site)
            .failure_times()
            .iter()
            .any(|&f| first_write_time < f && f <= now);
        if failed_after_write {
            return Err(AbortReason::SiteFailedAfterWrite(site));
        }
    }
    Ok(())
}

/// Gate B — First-committer-wins: abort if some other transaction
/// already committed a write to one of our written variables after we
/// started.
pub fn gate_b_first_committer_wins(
    tid: TxnId,
    txn: &Transaction,
    last_writer: &LastWriterIndex,
) -> Result<(), AbortReason> {
    for (var, _value) in txn.write_buffer() {
        if let Some((writer, commit_time)) = last_writer.get(var) {
            if writer != tid && commit_time > txn.start_time() {
                return Err(AbortReason::FirstCommitterWins(var, writer));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use repcrec_core::{SiteId, VarId};

    #[test]
    fn gate_a_passes_when_no_write_site_ever_failed() {
        let sites = SiteRegistry::genesis();
        let mut txn = Transaction::begin(TxnId::new(1), Time::ZERO);
        let mut targets = BTreeSet::new();
        targets.insert(SiteId::new(1).unwrap());
        txn.record_write(VarId::new(2).unwrap(), 1, &targets, Time::new(1));

        assert_eq!(gate_a_available_copies(&txn, &sites, Time::new(5)), Ok(()));
    }

    #[test]
    fn gate_a_aborts_when_a_write_site_fails_before_commit() {
        let mut sites = SiteRegistry::genesis();
        let mut txn = Transaction::begin(TxnId::new(1), Time::ZERO);
        let mut targets = BTreeSet::new();
        let site = SiteId::new(3).unwrap();
        targets.insert(site);
        txn.record_write(VarId::new(6).unwrap(), 66, &targets, Time::new(1));
        sites.fail(site, Time::new(2));

        assert_eq!(
            gate_a_available_copies(&txn, &sites, Time::new(5)),
            Err(AbortReason::SiteFailedAfterWrite(site))
        );
    }

    #[test]
    fn gate_a_ignores_failures_at_or_before_the_write() {
        let mut sites = SiteRegistry::genesis();
        let site = SiteId::new(3).unwrap();
        sites.fail(site, Time::new(1));
        sites.get_mut(site).recover(Time::new(2));

        let mut txn = Transaction::begin(TxnId::new(1), Time::ZERO);
        let mut targets = BTreeSet::new();
        targets.insert(site);
        txn.record_write(VarId::new(6).unwrap(), 66, &targets, Time::new(1));

        assert_eq!(gate_a_available_copies(&txn, &sites, Time::new(5)), Ok(()));
    }

    #[test]
    fn gate_b_aborts_on_a_later_first_committer() {
        let mut last_writer = LastWriterIndex::default();
        let x1 = VarId::new(1).unwrap();
        let other = TxnId::new(2);
        last_writer.set(x1, other, Time::new(5));

        let mut txn = Transaction::begin(TxnId::new(1), Time::new(1));
        let mut targets = BTreeSet::new();
        targets.insert(SiteId::new(2).unwrap());
        txn.record_write(x1, 1, &targets, Time::new(2));

        assert_eq!(
            gate_b_first_committer_wins(TxnId::new(1), &txn, &last_writer),
            Err(AbortReason::FirstCommitterWins(x1, other))
        );
    }

    #[test]
    fn gate_b_ignores_a_committer_that_predates_our_start() {
        let mut last_writer = LastWriterIndex::default();
        let x1 = VarId::new(1).unwrap();
        last_writer.set(x1, TxnId::new(2), Time::new(1));

        let mut txn = Transaction::begin(TxnId::new(1), Time::new(5));
        let mut targets = BTreeSet::new();
        targets.insert(SiteId::new(2).unwrap());
        txn.record_write(x1, 1, &targets, Time::new(6));

        assert_eq!(gate_b_first_committer_wins(TxnId::new(1), &txn, &last_writer), Ok(()));
    }

    proptest::proptest! {
        /// P4: a transaction that wrote to a site which later failed in
        /// `(write_time, commit_time]` always aborts Gate A; one whose
        /// write-site never failed in that window always passes.
        #[test]
        fn p4_available_copies_abort_matches_the_failure_window(
            write_time in 0i64..20,
            fail_time in 0i64..20,
            now in 0i64..20,
        ) {
            let mut sites = SiteRegistry::genesis();
            let site = SiteId::new(1).unwrap();
            if fail_time <= now {
                sites.fail(site, Time::new(fail_time));
            }

            let mut txn = Transaction::begin(TxnId::new(1), Time::ZERO);
            let mut targets = BTreeSet::new();
            targets.insert(site);
            txn.record_write(VarId::new(2).unwrap(), 1, &targets, Time::new(write_time));

            let result = gate_a_available_copies(&txn, &sites, Time::new(now));
            let should_abort = fail_time <= now && write_time < fail_time;
            proptest::prop_assert_eq!(result.is_err(), should_abort);
        }

        /// P5: first-committer-wins triggers exactly when some other
        /// transaction committed the same variable strictly after our
        /// start time.
        #[test]
        fn p5_first_committer_wins_matches_the_start_time_comparison(
            our_start in 0i64..20,
            their_commit in 0i64..20,
        ) {
            let x1 = VarId::new(1).unwrap();
            let mut last_writer = LastWriterIndex::default();
            let other = TxnId::new(2);
            last_writer.set(x1, other, Time::new(their_commit));

            let mut txn = Transaction::begin(TxnId::new(1), Time::new(our_start));
            let mut targets = BTreeSet::new();
            targets.insert(SiteId::new(2).unwrap());
            txn.record_write(x1, 1, &targets, Time::new(our_start));

            let result = gate_b_first_committer_wins(TxnId::new(1), &txn, &last_writer);
            proptest::prop_assert_eq!(result.is_err(), their_commit > our_start);
        }
    }
}
