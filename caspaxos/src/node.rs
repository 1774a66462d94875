use std::sync::Arc;

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::network::messages::{ProposeReply, Request, Response};
use crate::network::tcp::TcpClient;
use crate::paxos::acceptor::Acceptor;
use crate::paxos::proposer::Proposer;
use crate::paxos::AcceptorClient;

/// One cluster member: an acceptor plus a proposer that can be driven by clients.
pub struct Node<T> {
    id: u64,
    acceptor: Arc<Acceptor<T>>,
    proposer: Proposer<T>,
}

impl<T> Node<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(id: u64, acceptor: Arc<Acceptor<T>>, proposer: Proposer<T>) -> Self {
        Node {
            id,
            acceptor,
            proposer,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn acceptor(&self) -> &Arc<Acceptor<T>> {
        &self.acceptor
    }

    /// Applies one request to this node.
    pub async fn handle(&self, request: Request<T>) -> Response<T> {
        match request {
            Request::Prepare { ballot } => Response::Promise(self.acceptor.prepare(ballot)),
            Request::Accept { ballot, value } => {
                Response::Accepted(self.acceptor.accept(ballot, value))
            }
            Request::Propose {
                expected_state,
                payload,
            } => {
                let result = self.proposer.propose(expected_state, payload).await;
                Response::Proposed(ProposeReply::from(result))
            }
        }
    }
}

impl<T> Node<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Builds a node whose proposer reaches remote acceptors over TCP.
    ///
    /// The entry matching `config.listen` is this node's own acceptor and is
    /// called in-process.
    pub fn from_config(config: &Config) -> Self {
        let acceptor = Arc::new(Acceptor::new(config.node_id));
        let clients: Vec<Arc<dyn AcceptorClient<T>>> = config
            .acceptors
            .iter()
            .map(|address| -> Arc<dyn AcceptorClient<T>> {
                if *address == config.listen {
                    Arc::clone(&acceptor) as Arc<dyn AcceptorClient<T>>
                } else {
                    Arc::new(TcpClient::new(address.clone(), config.request_timeout))
                }
            })
            .collect();

        let proposer = Proposer::new(config.node_id, clients);
        info!(
            "Node {}: Cluster of {} acceptors, quorum {}",
            config.node_id,
            proposer.acceptor_count(),
            proposer.quorum()
        );
        Node::new(config.node_id, acceptor, proposer)
    }
}
