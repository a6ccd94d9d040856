//! Command-line interface of the `demux` binary.

use std::path::PathBuf;

use clap::Parser;

/// Serves the demo actions over one batched HTTP endpoint.
#[derive(Parser, Debug)]
#[command(name = "demux", version = demux_core::VERSION)]
pub(crate) struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    /// Overrides `server.port` from the configuration.
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn parses_config_and_port() {
        let cli =
            Cli::try_parse_from(["demux", "--config", "demux.toml", "--port", "9000"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("demux.toml")));
        assert_eq!(cli.port, Some(9000));
    }

    #[test]
    fn no_arguments_use_defaults() {
        let cli = Cli::try_parse_from(["demux"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.port.is_none());
    }

    #[rstest]
    #[case(&["demux", "--prot", "9000"], ErrorKind::UnknownArgument)]
    #[case(&["demux", "--port", "http"], ErrorKind::ValueValidation)]
    #[case(&["demux", "--port", "70000"], ErrorKind::ValueValidation)]
    #[case(&["demux", "--config"], ErrorKind::InvalidValue)]
    #[case(&["demux", "--version"], ErrorKind::DisplayVersion)]
    #[case(&["demux", "--help"], ErrorKind::DisplayHelp)]
    fn rejects_or_exits_early(#[case] args: &[&str], #[case] kind: ErrorKind) {
        let err = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn config_flag_does_not_swallow_next_flag() {
        let err = Cli::try_parse_from(["demux", "--config", "--port", "9000"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
