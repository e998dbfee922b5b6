use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::AsyncRead,
    net::TcpListener,
    select,
    task::JoinSet,
    time::{self, Instant},
};
use tracing::{debug, info, warn};
use utils::log_if_err;

use crate::{CoordinatorConfig, Recorder};

/// Accept loop: every connection gets its own task, finished tasks are
/// reaped by the same loop so the accept path never waits on a handler.
pub struct Coordinator {
    listener: TcpListener,
    recorder: Arc<Recorder>,
}

impl Coordinator {
    pub async fn bind(cfg: CoordinatorConfig) -> Result<Self> {
        let listener = utils::net::listen(cfg.bind.as_deref(), cfg.port, cfg.backlog)
            .await
            .context("failed to listen")?;

        info!(
            addr = %listener.local_addr()?,
            hostfile = %cfg.hostfile.display(),
            job = ?cfg.job,
            "coordinator listening"
        );

        Ok(Self {
            listener,
            recorder: Arc::new(Recorder::new(&cfg)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until the process ends.
    pub async fn run(self) {
        self.serve(std::future::pending()).await
    }

    /// Serves until `shutdown` resolves, then aborts handlers still waiting
    /// on their workers.
    pub async fn serve<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let listener = &self.listener;
        accept_loop(|| listener.accept(), self.recorder.clone(), shutdown).await
    }
}

/// Drives `accept` until `shutdown` resolves. After a failed accept the
/// accept branch sits out a backoff pause while shutdown and reaping stay
/// live.
async fn accept_loop<A, Fut, S, F>(mut accept: A, recorder: Arc<Recorder>, shutdown: F)
where
    A: FnMut() -> Fut,
    Fut: Future<Output = io::Result<(S, SocketAddr)>>,
    S: AsyncRead + Unpin + Send + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut handlers = JoinSet::new();
    let mut backoff = AcceptBackoff::default();
    let pause = time::sleep(Duration::ZERO);
    tokio::pin!(pause);
    let mut paused = false;

    loop {
        select! {
            _ = &mut shutdown => break,

            _ = &mut pause, if paused => paused = false,

            accepted = accept(), if !paused => match accepted {
                Ok((stream, peer)) => {
                    backoff.reset();
                    debug!(%peer, active = handlers.len(), "accepted");
                    let recorder = recorder.clone();
                    handlers.spawn(async move {
                        recorder.handle(stream, Some(peer)).await;
                    });
                }
                Err(err) => {
                    let wait = backoff.next_wait();
                    warn!(%err, ?wait, "accept");
                    pause.as_mut().reset(Instant::now() + wait);
                    paused = true;
                }
            },

            Some(joined) = handlers.join_next() => {
                log_if_err!(joined, "connection handler");
            }
        }
    }

    let outstanding = handlers.len();
    handlers.shutdown().await;
    info!(outstanding, "coordinator stopped");
}

const MIN_ACCEPT_WAIT: Duration = Duration::from_millis(10);
const MAX_ACCEPT_WAIT: Duration = Duration::from_secs(1);

/// Pause after failed accepts, doubling per consecutive failure so a broken
/// listener (e.g. out of file descriptors) does not spin.
#[derive(Debug, Default)]
struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    fn next_wait(&mut self) -> Duration {
        let wait = MIN_ACCEPT_WAIT
            .saturating_mul(1 << self.failures.min(7))
            .min(MAX_ACCEPT_WAIT);
        self.failures = self.failures.saturating_add(1);
        wait
    }

    fn reset(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod test {
    use tokio::{io::DuplexStream, sync::oneshot};
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let mut backoff = AcceptBackoff::default();
        let waits: Vec<u64> = (0..9)
            .map(|_| backoff.next_wait().as_millis() as u64)
            .collect();
        assert_eq!(waits, [10, 20, 40, 80, 160, 320, 640, 1000, 1000]);

        backoff.reset();
        assert_eq!(backoff.next_wait(), MIN_ACCEPT_WAIT);
    }

    #[tokio::test]
    #[traced_test]
    async fn shutdown_is_seen_during_accept_backoff() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recorder::new(&CoordinatorConfig {
            hostfile: dir.path().join("hostfile"),
            ..Default::default()
        }));

        let (stop, stopped) = oneshot::channel::<()>();
        let failing = || async {
            Err::<(DuplexStream, SocketAddr), _>(io::Error::new(
                io::ErrorKind::Other,
                "too many open files",
            ))
        };
        let served = tokio::spawn(accept_loop(failing, recorder, async {
            let _ = stopped.await;
        }));

        // 1270ms of growing pauses, then inside the first 1s pause
        time::sleep(Duration::from_millis(1400)).await;
        stop.send(()).unwrap();

        time::timeout(Duration::from_millis(300), served)
            .await
            .expect("loop kept sleeping after shutdown")
            .unwrap();
        assert!(logs_contain("too many open files"));
        assert!(logs_contain("coordinator stopped"));
    }

    #[tokio::test]
    async fn bind_conflict_is_fatal() {
        let first = Coordinator::bind(CoordinatorConfig {
            bind: Some("127.0.0.1".to_string()),
            port: 0,
            ..Default::default()
        })
        .await
        .unwrap();

        let err = Coordinator::bind(CoordinatorConfig {
            bind: Some("127.0.0.1".to_string()),
            port: first.local_addr().unwrap().port(),
            ..Default::default()
        })
        .await
        .err()
        .unwrap();
        assert!(format!("{err:#}").starts_with("failed to listen: unable to bind"));
    }
}
