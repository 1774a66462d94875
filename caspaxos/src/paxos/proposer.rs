use std::sync::Arc;

use futures::future::join_all;
use log::{info, warn};

use crate::error::{Phase, ProposeError};
use crate::paxos::ballot::{Ballot, BallotGenerator};
use crate::paxos::quorum::{majority, Tally};
use crate::paxos::value::{Cas, Change, Transform, Value};
use crate::paxos::AcceptorClient;

/// Drives prepare/accept rounds against a fixed set of acceptors.
///
/// Every call runs a full two-phase round with a fresh ballot. Each phase
/// waits for every acceptor to answer or fail before counting votes.
pub struct Proposer<T> {
    ballots: BallotGenerator,
    acceptors: Vec<Arc<dyn AcceptorClient<T>>>,
}

impl<T> Proposer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(node_id: u64, acceptors: Vec<Arc<dyn AcceptorClient<T>>>) -> Self {
        Proposer {
            ballots: BallotGenerator::new(node_id),
            acceptors,
        }
    }

    pub fn node_id(&self) -> u64 {
        self.ballots.node_id()
    }

    pub fn acceptor_count(&self) -> usize {
        self.acceptors.len()
    }

    pub fn quorum(&self) -> usize {
        majority(self.acceptors.len())
    }

    /// Writes `payload` if the register is empty or currently at `expected_state`.
    ///
    /// Returns the newly committed state.
    pub async fn propose(
        &self,
        expected_state: Option<u64>,
        payload: T,
    ) -> Result<u64, ProposeError> {
        self.propose_with(Cas::new(expected_state, payload)).await
    }

    /// Runs one round, letting `transform` pick the next payload from the
    /// value resolved in the prepare phase.
    pub async fn propose_with<F>(&self, transform: F) -> Result<u64, ProposeError>
    where
        F: Transform<T>,
    {
        let ballot = self.ballots.next_ballot();
        let needed = self.quorum();
        info!(
            "Proposer {}: Starting round with ballot {} against {} acceptors",
            self.node_id(),
            ballot,
            self.acceptors.len()
        );

        let (tally, current) = self.prepare(ballot).await;
        if !tally.has_majority(self.acceptors.len()) {
            warn!(
                "Proposer {}: Ballot {} got {} promises (needed {}, {} rejected, {} unreachable)",
                self.node_id(),
                ballot,
                tally.granted,
                needed,
                tally.rejected,
                tally.failed
            );
            return Err(ProposeError::QuorumUnavailable {
                phase: Phase::Prepare,
                granted: tally.granted,
                needed,
                current: None,
            });
        }

        let current_state = current.as_ref().map(|value| value.state);
        let payload = match transform.apply(current.as_ref()) {
            Change::Write(payload) => payload,
            Change::Abort => {
                warn!(
                    "Proposer {}: Ballot {} aborted, register at state {:?}",
                    self.node_id(),
                    ballot,
                    current_state
                );
                return Err(ProposeError::Conflict {
                    current: current_state,
                });
            }
        };

        let next = match Value::successor(current.as_ref(), payload) {
            Some(next) => next,
            None => {
                let current = current_state.unwrap_or(u64::MAX);
                warn!(
                    "Proposer {}: Ballot {} cannot advance past state {}",
                    self.node_id(),
                    ballot,
                    current
                );
                return Err(ProposeError::StateExhausted { current });
            }
        };
        let state = next.state;
        let tally = self.accept(ballot, next).await;
        if !tally.has_majority(self.acceptors.len()) {
            warn!(
                "Proposer {}: Ballot {} got {} accepts for state {} (needed {}, {} rejected, {} unreachable)",
                self.node_id(),
                ballot,
                tally.granted,
                state,
                needed,
                tally.rejected,
                tally.failed
            );
            return Err(ProposeError::QuorumUnavailable {
                phase: Phase::Accept,
                granted: tally.granted,
                needed,
                current: current_state,
            });
        }

        info!(
            "Proposer {}: Committed state {} with ballot {}",
            self.node_id(),
            state,
            ballot
        );
        Ok(state)
    }

    /// Phase 1. Returns the votes and the value accepted at the highest ballot
    /// among the granted promises.
    async fn prepare(&self, ballot: Ballot) -> (Tally, Option<Value<T>>) {
        let replies = join_all(
            self.acceptors
                .iter()
                .map(|acceptor| acceptor.prepare(ballot)),
        )
        .await;

        let mut tally = Tally::default();
        let mut highest: Option<(Ballot, Value<T>)> = None;
        for (acceptor, reply) in self.acceptors.iter().zip(replies) {
            match reply {
                Ok(promise) if promise.ok => {
                    tally.grant();
                    if let Some((accepted_ballot, value)) = promise.into_accepted() {
                        let is_higher = highest
                            .as_ref()
                            .map_or(true, |(best, _)| accepted_ballot > *best);
                        if is_higher {
                            highest = Some((accepted_ballot, value));
                        }
                    }
                }
                Ok(_) => tally.reject(),
                Err(err) => {
                    warn!(
                        "Proposer {}: Prepare {} to {} failed: {}",
                        self.node_id(),
                        ballot,
                        acceptor.endpoint(),
                        err
                    );
                    tally.fail();
                }
            }
        }

        (tally, highest.map(|(_, value)| value))
    }

    /// Phase 2.
    async fn accept(&self, ballot: Ballot, value: Value<T>) -> Tally {
        let replies = join_all(
            self.acceptors
                .iter()
                .map(|acceptor| acceptor.accept(ballot, value.clone())),
        )
        .await;

        let mut tally = Tally::default();
        for (acceptor, reply) in self.acceptors.iter().zip(replies) {
            match reply {
                Ok(accepted) if accepted.ok => tally.grant(),
                Ok(_) => tally.reject(),
                Err(err) => {
                    warn!(
                        "Proposer {}: Accept {} to {} failed: {}",
                        self.node_id(),
                        ballot,
                        acceptor.endpoint(),
                        err
                    );
                    tally.fail();
                }
            }
        }
        tally
    }
}
