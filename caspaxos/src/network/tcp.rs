use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};

use crate::error::TransportError;
use crate::network::codec::{read_frame, write_frame};
use crate::network::messages::{Accepted, Promise, ProposeReply, Request, Response};
use crate::node::Node;
use crate::paxos::ballot::Ballot;
use crate::paxos::value::Value;
use crate::paxos::AcceptorClient;

/// Talks to a remote node over TCP, one connection per request.
///
/// The whole exchange (connect, send, receive) is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct TcpClient {
    address: String,
    timeout: Duration,
}

impl TcpClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        TcpClient {
            address: address.into(),
            timeout,
        }
    }

    pub async fn call<T>(&self, request: &Request<T>) -> Result<Response<T>, TransportError>
    where
        T: Serialize + DeserializeOwned,
    {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.address).await?;
            stream.set_nodelay(true)?;
            write_frame(&mut stream, request).await?;
            let response: Option<Response<T>> = read_frame(&mut stream).await?;
            response.ok_or_else(|| {
                TransportError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before reply",
                ))
            })
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout(self.address.clone()))?
    }

    /// Asks the remote node to run a compare-and-swap round.
    pub async fn propose<T>(
        &self,
        expected_state: Option<u64>,
        payload: T,
    ) -> Result<ProposeReply, TransportError>
    where
        T: Serialize + DeserializeOwned,
    {
        let request = Request::Propose {
            expected_state,
            payload,
        };
        match self.call(&request).await? {
            Response::Proposed(reply) => Ok(reply),
            _ => Err(TransportError::UnexpectedReply("propose")),
        }
    }
}

impl<T> AcceptorClient<T> for TcpClient
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn endpoint(&self) -> String {
        self.address.clone()
    }

    fn prepare(&self, ballot: Ballot) -> BoxFuture<'_, Result<Promise<T>, TransportError>> {
        Box::pin(async move {
            match self.call::<T>(&Request::Prepare { ballot }).await? {
                Response::Promise(promise) => Ok(promise),
                _ => Err(TransportError::UnexpectedReply("prepare")),
            }
        })
    }

    fn accept(
        &self,
        ballot: Ballot,
        value: Value<T>,
    ) -> BoxFuture<'_, Result<Accepted, TransportError>> {
        Box::pin(async move {
            match self.call(&Request::Accept { ballot, value }).await? {
                Response::Accepted(accepted) => Ok(accepted),
                _ => Err(TransportError::UnexpectedReply("accept")),
            }
        })
    }
}

/// Accepts connections forever, serving each on its own task.
///
/// A connection that sends no request for `idle_timeout` is closed.
pub async fn serve<T>(
    listener: TcpListener,
    node: Arc<Node<T>>,
    idle_timeout: Duration,
) -> Result<(), TransportError>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    info!("Node {}: Listening on {}", node.id(), listener.local_addr()?);
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let node = Arc::clone(&node);
                tokio::spawn(async move {
                    if let Err(err) = serve_connection(stream, node, idle_timeout).await {
                        warn!("Connection from {} failed: {}", peer, err);
                    }
                });
            }
            Err(err) => {
                warn!("Node {}: Accept error: {}", node.id(), err);
            }
        }
    }
}

async fn serve_connection<T>(
    mut stream: TcpStream,
    node: Arc<Node<T>>,
    idle_timeout: Duration,
) -> Result<(), TransportError>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    stream.set_nodelay(true)?;
    loop {
        let next = tokio::time::timeout(idle_timeout, read_frame::<_, Request<T>>(&mut stream));
        let request = match next.await {
            Ok(frame) => frame?,
            Err(_) => {
                debug!("Node {}: Closing idle connection", node.id());
                return Ok(());
            }
        };
        let Some(request) = request else {
            break;
        };
        let response = node.handle(request).await;
        write_frame(&mut stream, &response).await?;
    }
    debug!("Node {}: Connection closed", node.id());
    Ok(())
}
