use clap::Parser;
use coordinator::{cli::Args, Coordinator, CoordinatorConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = run(args).await {
        utils::process::exit_fatal("rbatchd", &err);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    utils::logger::init(&utils::logger::Config {
        level: args.log_level.clone(),
    })?;

    let cfg = CoordinatorConfig::from(args);
    let coordinator = Coordinator::bind(cfg).await?;
    coordinator.serve(shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupted"),
            Err(err) => {
                error!(%err, "unable to listen for ctrl-c");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("terminated");
            }
            Err(err) => {
                error!(%err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
