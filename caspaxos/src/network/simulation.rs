use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::debug;
use rand::Rng;

use crate::error::TransportError;
use crate::network::messages::{Accepted, Promise};
use crate::paxos::acceptor::Acceptor;
use crate::paxos::ballot::Ballot;
use crate::paxos::value::Value;
use crate::paxos::AcceptorClient;

/// An in-process link to an acceptor that misbehaves like a network.
///
/// Each call waits a random latency, and either the request or the reply can
/// be lost with probability `loss`. A lost request never reaches the
/// acceptor; a lost reply is applied but reported as a timeout. While
/// unreachable, every call fails immediately.
pub struct SimulatedAcceptor<T> {
    acceptor: Arc<Acceptor<T>>,
    latency_ms: Range<u64>,
    loss: f64,
    unreachable: AtomicBool,
}

impl<T> SimulatedAcceptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(acceptor: Arc<Acceptor<T>>) -> Self {
        SimulatedAcceptor {
            acceptor,
            latency_ms: 0..0,
            loss: 0.0,
            unreachable: AtomicBool::new(false),
        }
    }

    pub fn with_latency(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_loss(mut self, loss: f64) -> Self {
        self.loss = loss.clamp(0.0, 1.0);
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable.load(Ordering::SeqCst)
    }

    fn lost(&self) -> bool {
        self.loss > 0.0 && rand::rng().random_bool(self.loss)
    }

    async fn deliver<R>(
        &self,
        handle: impl FnOnce(&Acceptor<T>) -> R,
    ) -> Result<R, TransportError> {
        if self.is_unreachable() {
            return Err(TransportError::Unreachable(self.endpoint()));
        }

        let delay = if self.latency_ms.is_empty() {
            0
        } else {
            rand::rng().random_range(self.latency_ms.clone())
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.lost() {
            debug!("Simulation: Request to {} lost", self.endpoint());
            return Err(TransportError::Timeout(self.endpoint()));
        }
        let reply = handle(&self.acceptor);
        if self.lost() {
            debug!("Simulation: Reply from {} lost", self.endpoint());
            return Err(TransportError::Timeout(self.endpoint()));
        }
        Ok(reply)
    }
}

impl<T> AcceptorClient<T> for SimulatedAcceptor<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn endpoint(&self) -> String {
        format!("sim:{}", self.acceptor.id())
    }

    fn prepare(&self, ballot: Ballot) -> BoxFuture<'_, Result<Promise<T>, TransportError>> {
        Box::pin(self.deliver(move |acceptor| acceptor.prepare(ballot)))
    }

    fn accept(
        &self,
        ballot: Ballot,
        value: Value<T>,
    ) -> BoxFuture<'_, Result<Accepted, TransportError>> {
        Box::pin(self.deliver(move |acceptor| acceptor.accept(ballot, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_acceptor_is_never_touched() {
        let acceptor = Arc::new(Acceptor::<u32>::new(4));
        let link = SimulatedAcceptor::new(Arc::clone(&acceptor));
        link.set_unreachable(true);

        let result = AcceptorClient::prepare(&link, Ballot::new(1, 1)).await;
        assert!(matches!(result, Err(TransportError::Unreachable(_))));
        assert_eq!(acceptor.snapshot().promised, Ballot::ZERO);

        link.set_unreachable(false);
        let promise = AcceptorClient::prepare(&link, Ballot::new(1, 1)).await.unwrap();
        assert!(promise.ok);
    }

    #[tokio::test]
    async fn total_loss_always_fails() {
        let link = SimulatedAcceptor::new(Arc::new(Acceptor::<u32>::new(1))).with_loss(1.0);
        for round in 1..10 {
            let result =
                AcceptorClient::accept(&link, Ballot::new(round, 1), Value::new(0, 0)).await;
            assert!(matches!(result, Err(TransportError::Timeout(_))));
        }
    }

    #[tokio::test]
    async fn latency_is_applied() {
        let link =
            SimulatedAcceptor::new(Arc::new(Acceptor::<u32>::new(1))).with_latency(20..21);
        let started = tokio::time::Instant::now();
        let promise = AcceptorClient::prepare(&link, Ballot::new(1, 1)).await.unwrap();
        assert!(promise.ok);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
