//! CLI argument parsing for Ascenso

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ascenso")]
#[command(version)]
#[command(
    about = "Baseline vs enhanced classifier evaluation, deployment gating, and auto-tuning",
    long_about = None
)]
pub struct Cli {
    /// Settings file (TOML)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare baseline and enhanced accuracy on a JSON record file
    Analyze {
        /// JSON array of outcome records
        records: PathBuf,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check deployment readiness; exits non-zero when not ready
    Gate {
        /// JSON array of outcome records
        records: PathBuf,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run one auto-tune cycle against a persisted tuning state
    Tune {
        /// JSON array of outcome records
        records: PathBuf,

        /// Tuning state document (created if missing)
        #[arg(long = "state", value_name = "FILE")]
        state: PathBuf,

        /// Request deployment when every gate check passes
        #[arg(long = "auto-deploy")]
        auto_deploy: bool,

        /// Flag file written on deployment
        #[arg(long = "deploy-flag", value_name = "FILE")]
        deploy_flag: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_analyze() {
        let cli = Cli::parse_from(["ascenso", "analyze", "records.json"]);
        match cli.command {
            Command::Analyze { records, format } => {
                assert_eq!(records, PathBuf::from("records.json"));
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("Expected analyze, got {:?}", other),
        }
        assert!(!cli.debug);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_analyze_json_format() {
        let cli = Cli::parse_from(["ascenso", "analyze", "r.json", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Command::Analyze {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_cli_gate() {
        let cli = Cli::parse_from(["ascenso", "gate", "r.json"]);
        assert!(matches!(cli.command, Command::Gate { .. }));
    }

    #[test]
    fn test_cli_tune_flags() {
        let cli = Cli::parse_from([
            "ascenso",
            "tune",
            "r.json",
            "--state",
            "state.json",
            "--auto-deploy",
            "--deploy-flag",
            "flag.json",
        ]);
        match cli.command {
            Command::Tune {
                state,
                auto_deploy,
                deploy_flag,
                ..
            } => {
                assert_eq!(state, PathBuf::from("state.json"));
                assert!(auto_deploy);
                assert_eq!(deploy_flag, Some(PathBuf::from("flag.json")));
            }
            other => panic!("Expected tune, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_tune_requires_state() {
        assert!(Cli::try_parse_from(["ascenso", "tune", "r.json"]).is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ascenso",
            "analyze",
            "r.json",
            "--debug",
            "--config",
            "ascenso.toml",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("ascenso.toml")));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["ascenso"]).is_err());
    }
}
