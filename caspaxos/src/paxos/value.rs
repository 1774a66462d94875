use serde::{Deserialize, Serialize};

/// The register's content: opaque payload plus its version counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value<T> {
    pub payload: T,
    pub state: u64,
}

impl<T> Value<T> {
    pub fn new(payload: T, state: u64) -> Self {
        Value { payload, state }
    }

    /// The value that replaces `current` with `payload`.
    ///
    /// An empty register commits at state 0, otherwise the state advances by one.
    /// Returns `None` once the state counter cannot advance any further.
    pub fn successor(current: Option<&Value<T>>, payload: T) -> Option<Self> {
        let state = match current {
            Some(value) => value.state.checked_add(1)?,
            None => 0,
        };
        Some(Value { payload, state })
    }
}

/// What a transform decides after seeing the register's current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<T> {
    /// Continue to the accept phase with this payload.
    Write(T),
    /// Stop before the accept phase.
    Abort,
}

/// A caller-supplied read-modify-write step, run once per round after the
/// prepare phase has resolved the current value.
pub trait Transform<T> {
    fn apply(self, current: Option<&Value<T>>) -> Change<T>;
}

impl<T, F> Transform<T> for F
where
    F: FnOnce(Option<&Value<T>>) -> Change<T>,
{
    fn apply(self, current: Option<&Value<T>>) -> Change<T> {
        self(current)
    }
}

/// Compare-and-swap: write `payload` only if the register is empty or its
/// state equals `expected_state`.
#[derive(Debug, Clone)]
pub struct Cas<T> {
    pub expected_state: Option<u64>,
    pub payload: T,
}

impl<T> Cas<T> {
    pub fn new(expected_state: Option<u64>, payload: T) -> Self {
        Cas {
            expected_state,
            payload,
        }
    }
}

impl<T> Transform<T> for Cas<T> {
    fn apply(self, current: Option<&Value<T>>) -> Change<T> {
        match current {
            None => Change::Write(self.payload),
            Some(value) if self.expected_state == Some(value.state) => Change::Write(self.payload),
            Some(_) => Change::Abort,
        }
    }
}
