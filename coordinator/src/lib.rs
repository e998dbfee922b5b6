pub mod cli;
pub mod config;
pub mod coordinator;
pub mod handler;
pub mod hostfile;

pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use handler::{render_peer, Recorder};
pub use hostfile::{HostEntry, Hostfile};
