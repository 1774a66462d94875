use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::network::messages::{Accepted, Promise};
use crate::paxos::ballot::Ballot;
use crate::paxos::value::Value;

/// Everything one acceptor remembers about the register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptorRecord<T> {
    /// Highest ballot seen through either Prepare or Accept.
    pub promised: Ballot,
    /// Ballot and value of the last accepted proposal.
    pub accepted: Option<(Ballot, Value<T>)>,
}

impl<T> Default for AcceptorRecord<T> {
    fn default() -> Self {
        AcceptorRecord {
            promised: Ballot::ZERO,
            accepted: None,
        }
    }
}

/// A single in-memory acceptor.
///
/// Each transition holds the record's lock for its whole read-compare-write,
/// so requests apply atomically and in arrival order.
#[derive(Debug)]
pub struct Acceptor<T> {
    id: u64,
    record: Mutex<AcceptorRecord<T>>,
}

impl<T: Clone> Acceptor<T> {
    pub fn new(id: u64) -> Self {
        Acceptor {
            id,
            record: Mutex::new(AcceptorRecord::default()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, AcceptorRecord<T>> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Phase 1: promise to ignore every ballot at or below `ballot`.
    pub fn prepare(&self, ballot: Ballot) -> Promise<T> {
        let mut record = self.lock();
        if ballot <= record.promised {
            warn!(
                "Acceptor {}: Stale prepare with ballot {} (already promised {})",
                self.id, ballot, record.promised
            );
            return Promise::rejected();
        }

        record.promised = ballot;
        info!("Acceptor {}: Promised ballot {}", self.id, ballot);
        Promise::granted(record.accepted.clone())
    }

    /// Phase 2: accept `value` unless a higher ballot has been promised since.
    pub fn accept(&self, ballot: Ballot, value: Value<T>) -> Accepted {
        let mut record = self.lock();
        if ballot < record.promised {
            warn!(
                "Acceptor {}: Stale accept with ballot {} (already promised {})",
                self.id, ballot, record.promised
            );
            return Accepted { ok: false };
        }

        info!(
            "Acceptor {}: Accepted state {} at ballot {}",
            self.id, value.state, ballot
        );
        record.promised = ballot;
        record.accepted = Some((ballot, value));
        Accepted { ok: true }
    }

    /// A copy of the current record.
    pub fn snapshot(&self) -> AcceptorRecord<T> {
        self.lock().clone()
    }
}
