use protocol::{JobId, Report};
use serde::{Deserialize, Serialize};
use utils::env::{self, EnvError};

/// Threads each worker process will run, used to split the node's processors.
pub const THREADS_ENV: &str = "OMP_NUM_THREADS";
pub const JOB_ID_ENV: &str = "AWS_BATCH_JOB_ID";
/// Address of the coordinator, set by the batch scheduler on every node.
pub const SERVER_ENV: &str = "AWS_BATCH_JOB_MAIN_NODE_PRIVATE_IPV4_ADDRESS";

/// Everything a worker needs to send its report. Built once at startup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub server: String,
    pub port: u16,
    pub slot_count: u32,
    pub job_id: JobId,
}

impl WorkerConfig {
    pub fn from_env(port: u16) -> Result<Self, EnvError> {
        Self::from_env_with_cpus(port, utils::process::logical_cpus())
    }

    pub fn from_env_with_cpus(port: u16, processors: u32) -> Result<Self, EnvError> {
        let thread_hint = env::require_u32(THREADS_ENV)?;
        let job_id = env::require_u32(JOB_ID_ENV)?;
        let server = env::require(SERVER_ENV)?;

        Ok(Self {
            server,
            port,
            slot_count: slots_per_process(processors, thread_hint),
            job_id,
        })
    }

    pub fn report(&self) -> Report {
        Report::new(self.slot_count, self.job_id)
    }
}

/// Share of the node's processors claimed by one process running
/// `thread_hint` threads. A hint of 0 claims every processor.
pub fn slots_per_process(processors: u32, thread_hint: u32) -> u32 {
    if thread_hint != 0 {
        processors / thread_hint
    } else {
        processors
    }
}
