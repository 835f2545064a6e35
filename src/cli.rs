//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ntee-report - count tables over IRS exempt organization extracts
///
/// Reads every CSV extract in the input directory and writes cross-tab
/// count reports by classification code, activity code, state and
/// income bracket.
///
/// Examples:
///   ntee-report --input data
///   ntee-report --input data --output reports --state TX
///   ntee-report --input data --tier-a 4 --tier-b 7 --summary run.json
///   ntee-report --input data --dry-run
///   ntee-report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the CSV extract files
    #[arg(short, long, default_value = "data", value_name = "DIR")]
    pub input: PathBuf,

    /// Directory the report files are written to
    ///
    /// Created if it does not exist. Existing reports are overwritten.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output: PathBuf,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ntee-report.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "NTEE_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// State abbreviation for the single-state columns and extracts
    #[arg(short, long, value_name = "ABBR")]
    pub state: Option<String>,

    /// First income threshold (inclusive income code)
    #[arg(long, value_name = "CODE")]
    pub tier_a: Option<u8>,

    /// Second income threshold (inclusive income code)
    #[arg(long, value_name = "CODE")]
    pub tier_b: Option<u8>,

    /// Also write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load the input and print data completeness, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .ntee-report.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if !self.input.exists() {
            return Err(format!(
                "Input directory does not exist: {}",
                self.input.display()
            ));
        }
        if !self.input.is_dir() {
            return Err(format!(
                "Input path is not a directory: {}",
                self.input.display()
            ));
        }

        if let Some(ref state) = self.state {
            if state.trim().is_empty() {
                return Err("State must not be empty".to_string());
            }
        }

        for (flag, tier) in [("--tier-a", self.tier_a), ("--tier-b", self.tier_b)] {
            if let Some(tier) = tier {
                if tier > 9 {
                    return Err(format!("{} must be an income code from 0 to 9", flag));
                }
            }
        }

        if let (Some(a), Some(b)) = (self.tier_a, self.tier_b) {
            if a > b {
                return Err("--tier-a must not exceed --tier-b".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            input: PathBuf::from("."),
            output: PathBuf::from("out"),
            config: None,
            state: None,
            tier_a: None,
            tier_b: None,
            summary: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::parse_from(["ntee-report"]);
        assert_eq!(args.input, PathBuf::from("data"));
        assert_eq!(args.output, PathBuf::from("."));
        assert!(args.state.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = PathBuf::from("definitely/not/here");
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_tiers() {
        let mut args = make_args();
        args.tier_a = Some(10);
        assert!(args.validate().is_err());

        args.tier_a = Some(7);
        args.tier_b = Some(5);
        assert!(args.validate().is_err());

        args.tier_b = Some(7);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.input = PathBuf::from("definitely/not/here");
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
