use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "rbatchd",
    version = protocol::VERSION,
    about = "Collect worker slot reports into a hostfile",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Hostfile the reports are appended to.
    #[arg(default_value = crate::config::DEFAULT_HOSTFILE)]
    pub hostfile: PathBuf,

    /// Port number to listen on.
    #[arg(short, long, default_value_t = protocol::DEFAULT_PORT)]
    pub port: u16,

    /// IPv4 address to bind, all interfaces when omitted.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Pending connection queue length.
    #[arg(long, default_value_t = protocol::DEFAULT_BACKLOG)]
    pub backlog: u32,

    /// Only record reports carrying this job id.
    #[arg(short, long)]
    pub job: Option<u32>,

    /// Seconds to wait for a connected worker's report, 0 waits forever.
    #[arg(long, default_value_t = 0)]
    pub read_timeout: u64,

    /// Log filter directive, RUST_LOG directives are applied as well.
    #[arg(long, env = "RBATCHD_LOG", default_value = "info")]
    pub log_level: String,

    /// Display this help and exit.
    #[arg(short = 'H', long, action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,

    /// Print the program version number.
    #[arg(short = 'V', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}
