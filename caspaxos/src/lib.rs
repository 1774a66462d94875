//! A single-register CASPaxos implementation.
//!
//! Acceptors each hold one versioned value. A proposer runs a prepare/accept
//! round against all of them to read-modify-write that value, committing
//! only with a majority of votes in both phases.

pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod paxos;
