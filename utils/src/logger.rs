use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::Writer, time::FormatTime},
    prelude::__tracing_subscriber_SubscriberExt,
    EnvFilter, Layer,
};

#[derive(Debug)]
pub struct Config {
    pub level: String,
}

struct LocalTimer;
impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f")
        )
    }
}

static ADDITION_DERECTIVE: &[&str] = &["tokio=warn", "mio=warn"];

/// Installs the global subscriber. Events go to stderr so that stdout
/// stays free for help and version output.
pub fn init(config: &Config) -> Result<()> {
    let std_err = fmt::Layer::new()
        .with_ansi(std::io::stderr().is_terminal())
        .with_timer(LocalTimer)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_filter(filter(config)?);

    let collector = tracing_subscriber::registry().with(std_err);
    tracing::subscriber::set_global_default(collector)?;
    Ok(())
}

/// `RUST_LOG` directives, then the configured level, then the noise filters.
fn filter(config: &Config) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.parse()?);
    for d in ADDITION_DERECTIVE {
        filter = filter.add_directive(d.parse()?);
    }
    Ok(filter)
}

/// Evaluates an expression returning `Result` and logs an error event if it
/// is `Err`. For results that are recorded but not handled.
#[macro_export]
macro_rules! log_if_err {
    ($run:expr) => {
        $crate::log_if_err!($run, stringify!($run))
    };

    ($run:expr, $msg:expr $(,)?) => {
        if let Err(err) = $run {
            ::tracing::error!(?err, concat!("FAILED: ", $msg))
        }
    };
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn level_directives() {
        for level in ["debug", "warn", "coordinator=trace"] {
            let cfg = Config {
                level: level.to_string(),
            };
            assert!(filter(&cfg).is_ok(), "{level}");
        }

        let cfg = Config {
            level: "coordinator=loud".to_string(),
        };
        assert!(filter(&cfg).is_err());
    }
}
