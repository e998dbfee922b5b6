use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(
    name = "rbatch",
    version = protocol::VERSION,
    about = "Report this node's execution slots to the job coordinator",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Args {
    /// Port number to contact the server on.
    #[arg(short, long, default_value_t = protocol::DEFAULT_PORT)]
    pub port: u16,

    /// Log filter directive, RUST_LOG directives are applied as well.
    #[arg(long, env = "RBATCH_LOG", default_value = "info")]
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

#[cfg(test)]
mod test {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn default_port() {
        let args = Args::try_parse_from(["rbatch"]).unwrap();
        assert_eq!(args.port, 2323);
    }

    #[test]
    fn short_and_long_port() {
        assert_eq!(Args::try_parse_from(["rbatch", "-p", "4000"]).unwrap().port, 4000);
        assert_eq!(Args::try_parse_from(["rbatch", "--port", "4001"]).unwrap().port, 4001);
    }

    #[test]
    fn help_and_version_flags() {
        let err = Args::try_parse_from(["rbatch", "-H"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = Args::try_parse_from(["rbatch", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        assert_eq!(err.to_string().trim(), format!("rbatch {}", protocol::VERSION));
    }

    #[test]
    fn unknown_option_fails() {
        let err = Args::try_parse_from(["rbatch", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_ne!(err.exit_code(), 0);
    }
}
