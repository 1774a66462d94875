/// Number of votes that form a majority of `acceptors`.
pub fn majority(acceptors: usize) -> usize {
    acceptors / 2 + 1
}

/// Votes collected in one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// `ok: true` replies.
    pub granted: usize,
    /// `ok: false` replies from live acceptors.
    pub rejected: usize,
    /// Acceptors that could not be reached; counted as negative votes.
    pub failed: usize,
}

impl Tally {
    pub fn grant(&mut self) {
        self.granted += 1;
    }

    pub fn reject(&mut self) {
        self.rejected += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn has_majority(&self, acceptors: usize) -> bool {
        self.granted >= majority(acceptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_sizes() {
        assert_eq!(majority(0), 1);
        assert_eq!(majority(1), 1);
        assert_eq!(majority(2), 2);
        assert_eq!(majority(3), 2);
        assert_eq!(majority(4), 3);
        assert_eq!(majority(5), 3);
    }

    #[test]
    fn five_acceptors_need_three_votes() {
        for granted in 0..=5 {
            let tally = Tally {
                granted,
                rejected: 5 - granted,
                failed: 0,
            };
            assert_eq!(tally.has_majority(5), granted >= 3, "granted={}", granted);
        }
    }

    #[test]
    fn failures_never_count_toward_majority() {
        let mut tally = Tally::default();
        tally.grant();
        tally.grant();
        tally.fail();
        tally.fail();
        tally.reject();
        assert_eq!((tally.granted, tally.rejected, tally.failed), (2, 1, 2));
        assert!(!tally.has_majority(5));
    }

    #[test]
    fn empty_cluster_never_reaches_majority() {
        assert!(!Tally::default().has_majority(0));
    }
}
