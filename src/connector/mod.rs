//! Transport connectors
//!
//! A [`Connector`] opens one stream connection to a [`Target`]. Attempts are
//! generic over the connector so the fan-out protocol can be exercised against
//! real sockets ([`NetConnector`]) or scripted in-process endpoints
//! ([`mock::MockConnector`]).
//!
//! # Closing
//!
//! Connections are owned values. Handing a connection to [`Connector::close`]
//! consumes it, so a connection can only ever be closed once.

pub mod mock;

#[cfg(test)]
pub(crate) mod testutil;

use crate::target::{Network, Target};
use std::future::Future;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UnixStream};

/// Connector trait for transport dialing
///
/// Implementations must be shareable across attempt tasks. A single connector
/// instance serves every attempt of every target in a run.
pub trait Connector: Send + Sync + 'static {
    /// Open connection handle
    type Conn: Send + 'static;

    /// Open one connection to the target
    ///
    /// The future must be cancel-safe: dropping it mid-dial abandons the dial
    /// without leaking a connection.
    fn connect(&self, target: &Target) -> impl Future<Output = io::Result<Self::Conn>> + Send;

    /// Close a connection previously returned by [`Connector::connect`]
    fn close(&self, conn: Self::Conn) -> impl Future<Output = ()> + Send {
        async move { drop(conn) }
    }
}

/// An open stream socket
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    Unix(UnixStream),
}

/// Connector for real TCP and Unix domain stream sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct NetConnector;

impl NetConnector {
    pub fn new() -> Self {
        Self
    }

    async fn connect_tcp(target: &Target) -> io::Result<TcpStream> {
        let mut last_err = None;

        // Addresses are tried in resolver order until one accepts
        for addr in target.resolve().await? {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses to dial")
        }))
    }
}

impl Connector for NetConnector {
    type Conn = Connection;

    async fn connect(&self, target: &Target) -> io::Result<Connection> {
        match target.network() {
            Network::Unix => Ok(Connection::Unix(UnixStream::connect(target.address()).await?)),
            Network::Tcp | Network::Tcp4 | Network::Tcp6 => {
                Ok(Connection::Tcp(Self::connect_tcp(target).await?))
            }
        }
    }

    async fn close(&self, conn: Connection) {
        let result = match conn {
            Connection::Tcp(mut stream) => stream.shutdown().await,
            Connection::Unix(mut stream) => stream.shutdown().await,
        };

        // The peer may already be gone; the socket is released on drop either way
        if let Err(e) = result {
            tracing::debug!("shutdown failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::testutil::{refused_address, CountingListener};
    use std::time::Duration;

    #[tokio::test]
    async fn test_net_connector_tcp() {
        let listener = CountingListener::bind().await;
        let target = Target::parse(&listener.address()).unwrap();
        let connector = NetConnector::new();

        let conn = connector.connect(&target).await.unwrap();
        assert!(matches!(conn, Connection::Tcp(_)));
        listener.wait_for_open(1, Duration::from_secs(2)).await;

        connector.close(conn).await;
        listener.wait_for_closed(1, Duration::from_secs(2)).await;
        assert_eq!(listener.accepted(), 1);
    }

    #[tokio::test]
    async fn test_net_connector_unix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conntest.sock");
        let _listener = tokio::net::UnixListener::bind(&path).unwrap();

        let target = Target::parse(&format!("unix::{}", path.display())).unwrap();
        let conn = NetConnector::new().connect(&target).await.unwrap();
        assert!(matches!(conn, Connection::Unix(_)));
    }

    #[tokio::test]
    async fn test_net_connector_refused() {
        let target = Target::parse(&refused_address()).unwrap();
        let err = NetConnector::new().connect(&target).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_net_connector_missing_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        let target =
            Target::parse(&format!("unix::{}", dir.path().join("absent.sock").display())).unwrap();
        assert!(NetConnector::new().connect(&target).await.is_err());
    }
}
