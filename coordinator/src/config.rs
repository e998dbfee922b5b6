use std::{path::PathBuf, time::Duration};

use protocol::JobId;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

pub const DEFAULT_HOSTFILE: &str = "hostfile";

/// Coordinator settings, fixed for the lifetime of the process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub bind: Option<String>,
    pub port: u16,
    pub backlog: u32,
    pub hostfile: PathBuf,
    /// Reports for other jobs are dropped when set.
    pub job: Option<JobId>,
    /// `None` waits for a report indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind: None,
            port: protocol::DEFAULT_PORT,
            backlog: protocol::DEFAULT_BACKLOG,
            hostfile: PathBuf::from(DEFAULT_HOSTFILE),
            job: None,
            read_timeout: None,
        }
    }
}

impl From<Args> for CoordinatorConfig {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            backlog: args.backlog,
            hostfile: args.hostfile,
            job: args.job,
            read_timeout: (args.read_timeout != 0).then(|| Duration::from_secs(args.read_timeout)),
        }
    }
}
