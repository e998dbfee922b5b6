pub mod cli;
pub mod config;
pub mod reporter;

pub use config::{slots_per_process, WorkerConfig};
pub use reporter::Reporter;
