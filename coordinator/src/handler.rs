use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use protocol::{JobId, ProtocolError, Report, ReportCodec};
use tokio::{io::AsyncRead, time};
use tokio_util::codec::FramedRead;
use tracing::{info, warn};

use crate::{CoordinatorConfig, HostEntry, Hostfile};

/// Textual form of a peer address, dotted-quad for IPv4 and colon-hex for
/// IPv6. Peers without an IP address have none.
pub fn render_peer(peer: Option<SocketAddr>) -> Option<String> {
    peer.map(|addr| addr.ip().to_string())
}

/// Turns one accepted connection into one hostfile line.
#[derive(Debug)]
pub struct Recorder {
    hostfile: Hostfile,
    job: Option<JobId>,
    read_timeout: Option<Duration>,
}

impl Recorder {
    pub fn new(cfg: &CoordinatorConfig) -> Self {
        Self {
            hostfile: Hostfile::new(&cfg.hostfile),
            job: cfg.job,
            read_timeout: cfg.read_timeout,
        }
    }

    pub fn hostfile(&self) -> &Hostfile {
        &self.hostfile
    }

    /// Records the connection's report and logs the outcome. Failures stay
    /// within this connection.
    pub async fn handle<S>(&self, stream: S, peer: Option<SocketAddr>)
    where
        S: AsyncRead + Unpin,
    {
        match self.record(stream, peer).await {
            Ok(entry) => info!(%entry, "recorded"),
            Err(err) => warn!(?peer, "report dropped: {err:#}"),
        }
    }

    /// Reads exactly one report and appends it. Nothing is written unless a
    /// complete report from a peer with an address arrived.
    pub async fn record<S>(&self, stream: S, peer: Option<SocketAddr>) -> Result<HostEntry>
    where
        S: AsyncRead + Unpin,
    {
        let host = render_peer(peer);

        let report = match self.read_timeout {
            Some(limit) => time::timeout(limit, read_report(stream))
                .await
                .with_context(|| format!("no report within {limit:?}"))??,
            None => read_report(stream).await?,
        };

        if let Some(job) = self.job {
            if report.job_id != job {
                bail!("report for job {} while coordinating job {job}", report.job_id);
            }
        }

        let Some(host) = host else {
            bail!("peer has no textual address");
        };

        let entry = HostEntry {
            host,
            slots: report.slot_count,
        };
        self.hostfile
            .append(&entry)
            .await
            .with_context(|| format!("append to {}", self.hostfile.path().display()))?;
        Ok(entry)
    }
}

/// Reads one fixed-size report; a connection that closes first is malformed.
pub async fn read_report<S>(stream: S) -> Result<Report, ProtocolError>
where
    S: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(stream, ReportCodec::new());
    match frames.next().await {
        Some(report) => report,
        None => Err(ProtocolError::MalformedMessage { received: 0 }),
    }
}
