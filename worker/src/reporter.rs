use anyhow::{Context, Result};
use futures::SinkExt;
use protocol::{Report, ReportCodec};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::FramedWrite;
use tracing::info;

use crate::WorkerConfig;

/// Sends a single report to the coordinator. There is exactly one
/// connection attempt and no retry.
pub struct Reporter<'a> {
    cfg: &'a WorkerConfig,
}

impl<'a> Reporter<'a> {
    pub fn new(cfg: &'a WorkerConfig) -> Self {
        Self { cfg }
    }

    pub async fn run(&self) -> Result<()> {
        let report = self.cfg.report();
        let stream = utils::net::connect(&self.cfg.server, self.cfg.port)
            .await
            .context("failed to connect")?;

        send(stream, report)
            .await
            .context("unable to send message")?;

        info!(
            server = %self.cfg.server,
            port = self.cfg.port,
            slots = report.slot_count,
            job_id = report.job_id,
            "report sent"
        );
        Ok(())
    }
}

/// Writes all of `report` to `stream` and shuts down the write half. A short
/// write surfaces as an error.
pub async fn send<S>(stream: S, report: Report) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(stream, ReportCodec::new());
    sink.send(report).await?;

    let mut stream = sink.into_inner();
    stream.shutdown().await?;
    Ok(())
}
