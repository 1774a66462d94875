pub mod acceptor;
pub mod ballot;
pub mod proposer;
pub mod quorum;
pub mod value;

use futures::future::{self, BoxFuture};

use crate::error::TransportError;
use crate::network::messages::{Accepted, Promise};
use acceptor::Acceptor;
use ballot::Ballot;
use value::Value;

/// How a proposer reaches one acceptor.
///
/// Implementations own their timeouts: a call must resolve, with an error if
/// need be, rather than leave the proposer waiting forever.
pub trait AcceptorClient<T>: Send + Sync {
    /// Label used in logs.
    fn endpoint(&self) -> String;

    fn prepare(&self, ballot: Ballot) -> BoxFuture<'_, Result<Promise<T>, TransportError>>;

    fn accept(
        &self,
        ballot: Ballot,
        value: Value<T>,
    ) -> BoxFuture<'_, Result<Accepted, TransportError>>;
}

/// In-process acceptors answer immediately.
impl<T> AcceptorClient<T> for Acceptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn endpoint(&self) -> String {
        format!("local:{}", self.id())
    }

    fn prepare(&self, ballot: Ballot) -> BoxFuture<'_, Result<Promise<T>, TransportError>> {
        Box::pin(future::ready(Ok(Acceptor::prepare(self, ballot))))
    }

    fn accept(
        &self,
        ballot: Ballot,
        value: Value<T>,
    ) -> BoxFuture<'_, Result<Accepted, TransportError>> {
        Box::pin(future::ready(Ok(Acceptor::accept(self, ballot, value))))
    }
}
