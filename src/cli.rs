//! CLI argument parsing module for verbump

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Keeps tracked software versions in sync with upstream releases
#[derive(Parser, Debug, Clone)]
#[command(
    name = "verbump",
    version,
    about = "Propose pull requests when tracked software versions drift from upstream"
)]
pub struct CliArgs {
    /// Check only the software entries with this name
    pub software: Option<String>,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Report what would be proposed without creating branches or pull requests
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print failures and proposals
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the number of entries reconciled at once
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,
}

impl CliArgs {
    /// Whether the progress bar should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["verbump"]);
        assert!(args.software.is_none());
        assert_eq!(args.config, PathBuf::from("config.toml"));
        assert!(!args.dry_run);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.concurrency.is_none());
        assert!(args.show_progress());
    }

    #[test]
    fn test_software_argument() {
        let args = CliArgs::parse_from(["verbump", "widget"]);
        assert_eq!(args.software.as_deref(), Some("widget"));
    }

    #[test]
    fn test_config_flag() {
        let args = CliArgs::parse_from(["verbump", "--config", "/etc/verbump.toml"]);
        assert_eq!(args.config, PathBuf::from("/etc/verbump.toml"));

        let args = CliArgs::parse_from(["verbump", "-c", "x.toml"]);
        assert_eq!(args.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_dry_run_flags() {
        assert!(CliArgs::parse_from(["verbump", "-n"]).dry_run);
        assert!(CliArgs::parse_from(["verbump", "--dry-run"]).dry_run);
    }

    #[test]
    fn test_json_disables_progress() {
        let args = CliArgs::parse_from(["verbump", "--json"]);
        assert!(args.json);
        assert!(!args.show_progress());
    }

    #[test]
    fn test_quiet_disables_progress() {
        let args = CliArgs::parse_from(["verbump", "-q"]);
        assert!(!args.show_progress());
    }

    #[test]
    fn test_concurrency() {
        let args = CliArgs::parse_from(["verbump", "--concurrency", "8"]);
        assert_eq!(args.concurrency, Some(8));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(CliArgs::try_parse_from(["verbump", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_combined_flags() {
        let args = CliArgs::parse_from([
            "verbump",
            "gadget",
            "-c",
            "ci.toml",
            "-n",
            "--json",
            "--verbose",
        ]);
        assert_eq!(args.software.as_deref(), Some("gadget"));
        assert_eq!(args.config, PathBuf::from("ci.toml"));
        assert!(args.dry_run);
        assert!(args.json);
        assert!(args.verbose);
    }
}
