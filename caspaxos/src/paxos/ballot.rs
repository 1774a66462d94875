use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A ballot number: a per-proposer round counter paired with the proposer's node id.
///
/// Ordered lexicographically, round first. Two proposers minting the same round
/// never collide because their node ids differ.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Ballot {
    pub round: u64,
    pub node_id: u64,
}

impl Ballot {
    /// Lower than every ballot a generator can mint.
    pub const ZERO: Self = Self {
        round: 0,
        node_id: 0,
    };

    pub const fn new(round: u64, node_id: u64) -> Self {
        Self { round, node_id }
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.round, self.node_id)
    }
}

/// Mints strictly increasing ballots for one proposer.
#[derive(Debug)]
pub struct BallotGenerator {
    node_id: u64,
    round: AtomicU64,
}

impl BallotGenerator {
    pub fn new(node_id: u64) -> Self {
        BallotGenerator {
            node_id,
            round: AtomicU64::new(0),
        }
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Returns a ballot strictly greater than every ballot previously returned.
    pub fn next_ballot(&self) -> Ballot {
        let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;
        Ballot::new(round, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ballots_are_strictly_increasing() {
        let generator = BallotGenerator::new(7);
        let mut last = Ballot::ZERO;
        for _ in 0..100 {
            let ballot = generator.next_ballot();
            assert!(ballot > last, "{} should be above {}", ballot, last);
            assert_eq!(ballot.node_id, 7);
            last = ballot;
        }
    }

    #[test]
    fn same_round_different_nodes_do_not_collide() {
        let a = BallotGenerator::new(1).next_ballot();
        let b = BallotGenerator::new(2).next_ballot();
        assert_eq!(a.round, b.round);
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn round_dominates_node_id() {
        assert!(Ballot::new(2, 0) > Ballot::new(1, u64::MAX));
    }

    #[test]
    fn concurrent_callers_never_see_duplicates() {
        let generator = Arc::new(BallotGenerator::new(3));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                thread::spawn(move || (0..250).map(|_| generator.next_ballot()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for ballot in handle.join().unwrap() {
                assert!(seen.insert(ballot), "duplicate ballot {}", ballot);
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
