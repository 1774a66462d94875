use std::fmt;

use thiserror::Error;

/// The two phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Accept,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prepare => f.write_str("prepare"),
            Phase::Accept => f.write_str("accept"),
        }
    }
}

/// Why a proposal did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposeError {
    /// Fewer than a majority of acceptors voted yes in `phase`.
    #[error("{phase} phase reached {granted} of {needed} required votes")]
    QuorumUnavailable {
        phase: Phase,
        granted: usize,
        needed: usize,
        /// State resolved by the prepare phase, when it got that far.
        current: Option<u64>,
    },

    /// The transform refused the current value; `current` is its state,
    /// absent when the register is still empty.
    #[error("transform aborted at state {current:?}")]
    Conflict { current: Option<u64> },

    /// The register is at the largest representable state.
    #[error("state counter exhausted at {current}")]
    StateExhausted { current: u64 },
}

impl ProposeError {
    /// Best known state of the register at the time of failure.
    pub fn current_state(&self) -> Option<u64> {
        match self {
            ProposeError::QuorumUnavailable { current, .. } => *current,
            ProposeError::Conflict { current } => *current,
            ProposeError::StateExhausted { current } => Some(*current),
        }
    }
}

/// Failure to exchange a message with one acceptor.
///
/// The proposer counts any of these as a negative vote.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("acceptor {0} is unreachable")]
    Unreachable(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("unexpected reply to {0} request")]
    UnexpectedReply(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid yaml: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("config is empty")]
    Empty,

    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
