use clap::Parser;
use tracing::debug;
use worker::{cli::Args, Reporter, WorkerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        utils::process::exit_fatal("rbatch", &err);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    utils::logger::init(&utils::logger::Config {
        level: args.log_level,
    })?;

    let cfg = WorkerConfig::from_env(args.port)?;
    debug!(?cfg, "running worker");

    Reporter::new(&cfg).run().await
}
