//! IPv4 socket setup shared by the reporting worker and the coordinator.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
};

use tokio::net::{lookup_host, TcpListener, TcpSocket, TcpStream};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("unable to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("unable to connect to {host}:{port} after {attempts} candidate(s)")]
    ConnectionUnavailable {
        host: String,
        port: u16,
        attempts: usize,
        #[source]
        last: Option<io::Error>,
    },

    #[error("unable to bind {host}:{port} after {attempts} candidate(s)")]
    BindUnavailable {
        host: String,
        port: u16,
        attempts: usize,
        #[source]
        last: Option<io::Error>,
    },
}

/// Resolves `host` keeping only IPv4 candidates, in resolver order.
pub async fn resolve_v4(host: &str, port: u16) -> Result<Vec<SocketAddrV4>, NetError> {
    let addrs = lookup_host((host, port))
        .await
        .map_err(|source| NetError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;

    Ok(addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        })
        .collect())
}

/// Opens an outbound connection to the first candidate that accepts it.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, NetError> {
    let candidates = resolve_v4(host, port).await?;
    debug!(host, port, ?candidates, "resolved");

    let mut last = None;
    for addr in &candidates {
        match TcpStream::connect(*addr).await {
            Ok(stream) => {
                debug!(%addr, "connected");
                return Ok(stream);
            }
            Err(err) => {
                warn!(%addr, %err, "unable to connect");
                last = Some(err);
            }
        }
    }

    Err(NetError::ConnectionUnavailable {
        host: host.to_string(),
        port,
        attempts: candidates.len(),
        last,
    })
}

/// Binds a listening socket with `SO_REUSEADDR` set so that a restarted
/// process can take the port back while old connections sit in TIME_WAIT.
///
/// With no `host` the socket binds the IPv4 wildcard address.
pub async fn listen(host: Option<&str>, port: u16, backlog: u32) -> Result<TcpListener, NetError> {
    let candidates = match host {
        Some(host) => resolve_v4(host, port).await?,
        None => vec![SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)],
    };

    let mut last = None;
    for addr in &candidates {
        match bind_v4(*addr, backlog) {
            Ok(listener) => {
                debug!(%addr, backlog, "listening");
                return Ok(listener);
            }
            Err(err) => {
                warn!(%addr, %err, "unable to bind");
                last = Some(err);
            }
        }
    }

    Err(NetError::BindUnavailable {
        host: host.unwrap_or("0.0.0.0").to_string(),
        port,
        attempts: candidates.len(),
        last,
    })
}

fn bind_v4(addr: SocketAddrV4, backlog: u32) -> io::Result<TcpListener> {
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(SocketAddr::V4(addr))?;
    socket.listen(backlog)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn listen_then_connect() {
        let listener = listen(Some("127.0.0.1"), 0, 16).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (conn, accepted) = tokio::join!(connect("127.0.0.1", port), listener.accept());
        let conn = conn.unwrap();
        let (_, peer) = accepted.unwrap();
        assert_eq!(conn.local_addr().unwrap(), peer);
    }

    #[tokio::test]
    async fn refused_is_unavailable() {
        let listener = listen(Some("127.0.0.1"), 0, 1).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ConnectionUnavailable { attempts: 1, last: Some(_), .. }
        ));
    }

    #[tokio::test]
    async fn ipv6_only_host_has_no_candidates() {
        let err = connect("::1", 2323).await.unwrap_err();
        assert!(matches!(
            err,
            NetError::ConnectionUnavailable { attempts: 0, last: None, .. }
        ));
    }

    #[tokio::test]
    async fn port_in_use_is_bind_unavailable() {
        let first = listen(Some("127.0.0.1"), 0, 1).await.unwrap();
        let port = first.local_addr().unwrap().port();

        let err = listen(Some("127.0.0.1"), port, 1).await.unwrap_err();
        assert!(matches!(err, NetError::BindUnavailable { attempts: 1, .. }));
    }
}
