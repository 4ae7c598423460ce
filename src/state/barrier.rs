//! "Everybody agrees" gates used for readiness and restart votes.

use indexmap::IndexSet;

use crate::state::game::PlayerId;

/// What a barrier gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierKind {
    /// Lobby readiness and next-level acknowledgements.
    Ready,
    /// Votes to restart the session.
    Restart,
}

/// Set-based consensus tracker whose threshold is the current player count.
///
/// Completion is edge-triggered through [`ConsensusBarrier::try_fire`]: once it
/// fires it stays silent until [`ConsensusBarrier::clear`] is called.
#[derive(Debug, Clone)]
pub struct ConsensusBarrier {
    kind: BarrierKind,
    members: IndexSet<PlayerId>,
    fired: bool,
}

impl ConsensusBarrier {
    /// Empty barrier.
    pub fn new(kind: BarrierKind) -> Self {
        Self {
            kind,
            members: IndexSet::new(),
            fired: false,
        }
    }

    /// Purpose of this barrier.
    pub fn kind(&self) -> BarrierKind {
        self.kind
    }

    /// Opt a player in. Returns `false` if they already were.
    pub fn add(&mut self, id: &str) -> bool {
        self.members.insert(id.to_owned())
    }

    /// Opt a player out. Returns `false` if they were not in.
    pub fn remove(&mut self, id: &str) -> bool {
        self.members.shift_remove(id)
    }

    /// Add or remove depending on `flag`.
    pub fn set(&mut self, id: &str, flag: bool) -> bool {
        if flag { self.add(id) } else { self.remove(id) }
    }

    /// Whether `id` opted in.
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Every one of `total` players opted in, with at least one player present.
    pub fn is_complete(&self, total: usize) -> bool {
        total > 0 && self.members.len() >= total
    }

    /// `(opted in, total)`.
    pub fn progress(&self, total: usize) -> (usize, usize) {
        (self.members.len(), total)
    }

    /// Return `true` exactly once per completion.
    pub fn try_fire(&mut self, total: usize) -> bool {
        if self.fired || !self.is_complete(total) {
            return false;
        }
        self.fired = true;
        true
    }

    /// Drop every member and re-arm the barrier.
    pub fn clear(&mut self) {
        self.members.clear();
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_when_everyone_opts_in() {
        let mut barrier = ConsensusBarrier::new(BarrierKind::Ready);
        barrier.add("a");
        assert!(!barrier.is_complete(2));
        barrier.add("b");
        assert!(barrier.is_complete(2));
        assert_eq!(barrier.progress(2), (2, 2));
    }

    #[test]
    fn empty_group_never_completes() {
        let barrier = ConsensusBarrier::new(BarrierKind::Restart);
        assert!(!barrier.is_complete(0));
    }

    #[test]
    fn shrinking_membership_completes_barrier() {
        let mut barrier = ConsensusBarrier::new(BarrierKind::Ready);
        for id in ["a", "b", "c"] {
            barrier.add(id);
        }
        assert!(!barrier.is_complete(4));
        assert!(barrier.is_complete(3));
    }

    #[test]
    fn fires_only_once_until_cleared() {
        let mut barrier = ConsensusBarrier::new(BarrierKind::Ready);
        barrier.add("a");
        assert!(barrier.try_fire(1));
        assert!(!barrier.try_fire(1));
        barrier.clear();
        assert!(!barrier.try_fire(1));
        barrier.add("a");
        assert!(barrier.try_fire(1));
    }

    #[test]
    fn votes_toggle() {
        let mut barrier = ConsensusBarrier::new(BarrierKind::Restart);
        assert!(barrier.set("a", true));
        assert!(!barrier.set("a", true));
        assert!(barrier.contains("a"));
        assert!(barrier.set("a", false));
        assert!(!barrier.contains("a"));
        assert_eq!(barrier.progress(3), (0, 3));
    }
}
