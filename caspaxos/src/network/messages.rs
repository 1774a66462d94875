use serde::{Deserialize, Serialize};

use crate::error::ProposeError;
use crate::paxos::ballot::Ballot;
use crate::paxos::value::Value;

/// Reply to a Prepare.
///
/// `accepted_ballot` and `accepted_value` are either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise<T> {
    pub ok: bool,
    pub accepted_ballot: Option<Ballot>,
    pub accepted_value: Option<Value<T>>,
}

impl<T> Promise<T> {
    pub fn rejected() -> Self {
        Promise {
            ok: false,
            accepted_ballot: None,
            accepted_value: None,
        }
    }

    pub fn granted(accepted: Option<(Ballot, Value<T>)>) -> Self {
        let (accepted_ballot, accepted_value) = match accepted {
            Some((ballot, value)) => (Some(ballot), Some(value)),
            None => (None, None),
        };
        Promise {
            ok: true,
            accepted_ballot,
            accepted_value,
        }
    }

    /// Consumes the promise, keeping only a complete accepted proposal.
    pub fn into_accepted(self) -> Option<(Ballot, Value<T>)> {
        match (self.accepted_ballot, self.accepted_value) {
            (Some(ballot), Some(value)) => Some((ballot, value)),
            _ => None,
        }
    }

    /// The accepted proposal carried by this promise, if it carries a complete one.
    pub fn accepted(&self) -> Option<(Ballot, &Value<T>)> {
        match (self.accepted_ballot, self.accepted_value.as_ref()) {
            (Some(ballot), Some(value)) => Some((ballot, value)),
            _ => None,
        }
    }
}

/// Reply to an Accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepted {
    pub ok: bool,
}

/// Reply to a client Propose.
///
/// `state` is the committed state on success, otherwise the best known
/// current state (absent when no quorum answered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeReply {
    pub ok: bool,
    pub state: Option<u64>,
}

impl From<Result<u64, ProposeError>> for ProposeReply {
    fn from(result: Result<u64, ProposeError>) -> Self {
        match result {
            Ok(state) => ProposeReply {
                ok: true,
                state: Some(state),
            },
            Err(err) => ProposeReply {
                ok: false,
                state: err.current_state(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request<T> {
    Prepare {
        ballot: Ballot,
    },
    Accept {
        ballot: Ballot,
        value: Value<T>,
    },
    Propose {
        expected_state: Option<u64>,
        payload: T,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response<T> {
    Promise(Promise<T>),
    Accepted(Accepted),
    Proposed(ProposeReply),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Phase;

    #[test]
    fn promise_wire_shape() {
        let promise = Promise::granted(Some((Ballot::new(2, 1), Value::new(7, 3))));
        let json = serde_json::to_value(Response::Promise(promise)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "promise",
                "ok": true,
                "accepted_ballot": { "round": 2, "node_id": 1 },
                "accepted_value": { "payload": 7, "state": 3 },
            })
        );
    }

    #[test]
    fn promise_without_accepted_fields_decodes() {
        let promise: Promise<u32> = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert_eq!(promise, Promise::rejected());
        assert_eq!(promise.accepted(), None);
    }

    #[test]
    fn half_filled_promise_carries_nothing() {
        let promise = Promise::<u32> {
            ok: true,
            accepted_ballot: Some(Ballot::new(1, 1)),
            accepted_value: None,
        };
        assert_eq!(promise.accepted(), None);
    }

    #[test]
    fn response_decodes_for_payload_without_default() {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        struct Blob(u32);

        let promise = Promise::granted(Some((Ballot::new(1, 2), Value::new(Blob(9), 4))));
        let json = serde_json::to_string(&Response::Promise(promise.clone())).unwrap();
        let decoded: Response<Blob> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, Response::Promise(promise));

        let decoded: Response<Blob> =
            serde_json::from_str(r#"{"type":"promise","ok":false}"#).unwrap();
        assert_eq!(decoded, Response::Promise(Promise::rejected()));
    }

    #[test]
    fn propose_reply_from_outcomes() {
        assert_eq!(
            ProposeReply::from(Ok(4)),
            ProposeReply {
                ok: true,
                state: Some(4)
            }
        );
        assert_eq!(
            ProposeReply::from(Err(ProposeError::Conflict { current: Some(1) })),
            ProposeReply {
                ok: false,
                state: Some(1)
            }
        );
        assert_eq!(
            ProposeReply::from(Err(ProposeError::StateExhausted { current: u64::MAX })),
            ProposeReply {
                ok: false,
                state: Some(u64::MAX)
            }
        );
        let unavailable = ProposeError::QuorumUnavailable {
            phase: Phase::Prepare,
            granted: 1,
            needed: 2,
            current: None,
        };
        assert_eq!(
            ProposeReply::from(Err(unavailable)),
            ProposeReply {
                ok: false,
                state: None
            }
        );
    }

    #[test]
    fn propose_request_defaults_expected_state() {
        let request: Request<String> =
            serde_json::from_str(r#"{"type":"propose","payload":"v1"}"#).unwrap();
        assert_eq!(
            request,
            Request::Propose {
                expected_state: None,
                payload: "v1".to_string()
            }
        );
    }
}
