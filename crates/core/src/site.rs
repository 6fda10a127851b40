//! A single site's up/down state and locally-held committed values.
//!
//! Per spec Section 3 Invariant S1, failures and recoveries strictly
//! interleave starting with "up"; `fail`/`recover` are no-ops when the site
//! is already in the target state. Invariant S2 (the read gate) is carried
//! as an explicit, total map over the variables a site holds — per the
//! REDESIGN FLAG in SPEC_FULL.md, there is no implicit "default to
//! readable" fallback the way the Python reference's `can_read.get(var,
//! True)` has.

use std::collections::HashMap;

use crate::time::Time;
use crate::types::{SiteId, VarId};

/// A site's state: up/down, its locally-held data, and its read gates.
#[derive(Debug, Clone)]
pub struct Site {
    id: SiteId,
    is_up: bool,
    data: HashMap<VarId, i64>,
    can_read: HashMap<VarId, bool>,
    failure_times: Vec<Time>,
    recovery_times: Vec<Time>,
}

impl Site {
    /// Construct a site that starts up, holding the given variables with
    /// the given initial values and read gates (all `true` at genesis,
    /// since every variable's initial version is readable everywhere it
    /// lives).
    pub fn new(id: SiteId, initial_data: HashMap<VarId, i64>) -> Self {
        let can_read = initial_data.keys().map(|&v| (v, true)).collect();
        Site {
            id,
            is_up: true,
            data: initial_data,
            can_read,
            failure_times: Vec::new(),
            recovery_times: Vec::new(),
        }
    }

    /// This site's id.
    pub fn id(&self) -> SiteId {
        self.id
    }

    /// Whether the site is currently up.
    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Whether this site holds a local copy of `var`.
    pub fn holds(&self, var: VarId) -> bool {
        self.data.contains_key(&var)
    }

    /// The currently committed value of `var` at this site, if held.
    pub fn value_of(&self, var: VarId) -> Option<i64> {
        self.data.get(&var).copied()
    }

    /// All variables held at this site, each with its current value, in
    /// ascending variable order (used by the snapshot dumper).
    pub fn held_variables(&self) -> Vec<(VarId, i64)> {
        let mut pairs: Vec<_> = self.data.iter().map(|(&v, &val)| (v, val)).collect();
        pairs.sort_by_key(|(v, _)| v.index());
        pairs
    }

    /// Whether this site's read gate for `var` is currently open.
    ///
    /// # Panics
    /// Panics in debug builds if the site does not hold `var` at all —
    /// asking whether an unheld variable is readable is a caller bug, not
    /// a legitimate question with an implicit answer.
    pub fn may_read(&self, var: VarId) -> bool {
        match self.can_read.get(&var) {
            Some(&open) => open,
            None => {
                debug_assert!(false, "site {} does not hold {var}", self.id);
                false
            }
        }
    }

    /// Set the read gate for `var` at this site. Used at commit (reopens
    /// the gate for the site that just received the write) and at recovery
    /// (recomputes the gate for every held variable).
    pub fn set_read_gate(&mut self, var: VarId, open: bool) {
        self.can_read.insert(var, open);
    }

    /// Apply a committed write locally. Reopens the read gate for `var`.
    pub fn apply_write(&mut self, var: VarId, value: i64) {
        self.data.insert(var, value);
        self.can_read.insert(var, true);
    }

    /// The ordered log of failure timestamps.
    pub fn failure_times(&self) -> &[Time] {
        &self.failure_times
    }

    /// Mark the site down. No-op if already down (Invariant S1).
    ///
    /// Returns `true` if the site transitioned from up to down.
    pub fn fail(&mut self, now: Time) -> bool {
        if !self.is_up {
            return false;
        }
        self.is_up = false;
        self.failure_times.push(now);
        true
    }

    /// Mark the site up. No-op if already up (Invariant S1).
    ///
    /// Returns `true` if the site transitioned from down to up. Does not
    /// recompute read gates — that is the caller's job (it needs the
    /// version history, which this type does not have access to), per
    /// spec Section 4.5.
    pub fn recover(&mut self, now: Time) -> bool {
        if self.is_up {
            return false;
        }
        self.is_up = true;
        self.recovery_times.push(now);
        true
    }

    /// Whether this site had no failure strictly after `since` and at or
    /// before `until` — the continuous-uptime predicate of spec Section
    /// 4.2 used to compute the `eligible` set for replicated reads.
    pub fn up_continuously(&self, since: Time, until: Time) -> bool {
        !self.failure_times.iter().any(|&f| since < f && f <= until)
    }
}
