//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ntee-report.toml` files. The code lists of interest live here.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".ntee-report.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file settings.
    #[serde(default)]
    pub input: InputConfig,

    /// Codes of interest.
    #[serde(default)]
    pub codes: CodesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Row-level extract code lists.
    #[serde(default)]
    pub extracts: ExtractsConfig,
}

/// Input file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// File extension of input files.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Column holding the classification (NTEE) code.
    #[serde(default = "default_classification_column")]
    pub classification_column: String,

    /// Column holding the compound activity code.
    #[serde(default = "default_activity_column")]
    pub activity_column: String,

    /// Column holding the state abbreviation.
    #[serde(default = "default_state_column")]
    pub state_column: String,

    /// Column holding the income bracket code.
    #[serde(default = "default_income_column")]
    pub income_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            classification_column: default_classification_column(),
            activity_column: default_activity_column(),
            state_column: default_state_column(),
            income_column: default_income_column(),
        }
    }
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_classification_column() -> String {
    "NTEE_CD".to_string()
}

fn default_activity_column() -> String {
    "ACTIVITY".to_string()
}

fn default_state_column() -> String {
    "STATE".to_string()
}

fn default_income_column() -> String {
    "INCOME_CD".to_string()
}

/// Codes of interest, in report row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodesConfig {
    /// Classification codes.
    #[serde(default = "default_classification_codes")]
    pub classification: Vec<String>,

    /// Activity sub-codes.
    #[serde(default = "default_activity_codes")]
    pub activity: Vec<String>,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            classification: default_classification_codes(),
            activity: default_activity_codes(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn default_classification_codes() -> Vec<String> {
    strings(&["J20", "J21", "J22", "J30", "J32", "J33", "J99"])
}

fn default_activity_codes() -> Vec<String> {
    strings(&["150", "151", "152", "153"])
}

/// Report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// State abbreviation used for the single-state columns and extracts.
    #[serde(default = "default_focus_state")]
    pub focus_state: String,

    /// First income threshold (inclusive).
    #[serde(default = "default_tier_a")]
    pub tier_a: u8,

    /// Second income threshold (inclusive).
    #[serde(default = "default_tier_b")]
    pub tier_b: u8,

    /// Output file names.
    #[serde(default)]
    pub files: OutputFiles,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            focus_state: default_focus_state(),
            tier_a: default_tier_a(),
            tier_b: default_tier_b(),
            files: OutputFiles::default(),
        }
    }
}

fn default_focus_state() -> String {
    "CO".to_string()
}

fn default_tier_a() -> u8 {
    5 // $500,000 and up
}

fn default_tier_b() -> u8 {
    6 // $1,000,000 and up
}

/// Output file names, relative to the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputFiles {
    #[serde(default = "default_activity_file")]
    pub activity: String,

    #[serde(default = "default_classification_file")]
    pub classification: String,

    #[serde(default = "default_all_states_file")]
    pub all_states: String,

    #[serde(default = "default_extracts_file")]
    pub extracts: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            activity: default_activity_file(),
            classification: default_classification_file(),
            all_states: default_all_states_file(),
            extracts: default_extracts_file(),
        }
    }
}

fn default_activity_file() -> String {
    "activity_crosstab.csv".to_string()
}

fn default_classification_file() -> String {
    "classification_crosstab.csv".to_string()
}

fn default_all_states_file() -> String {
    "all_states_crosstab.csv".to_string()
}

fn default_extracts_file() -> String {
    "extracts.csv".to_string()
}

/// Code lists selecting the rows copied into the extracts file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractsConfig {
    /// Classification codes, focus state only.
    #[serde(default = "default_classification_codes")]
    pub state_classification: Vec<String>,

    /// Activity sub-codes, focus state only.
    #[serde(default = "default_activity_codes")]
    pub state_activity: Vec<String>,

    /// Classification codes, all states.
    #[serde(default = "default_national_classification")]
    pub national_classification: Vec<String>,
}

impl Default for ExtractsConfig {
    fn default() -> Self {
        Self {
            state_classification: default_classification_codes(),
            state_activity: default_activity_codes(),
            national_classification: default_national_classification(),
        }
    }
}

fn default_national_classification() -> Vec<String> {
    strings(&["J30", "J32", "J33"])
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref state) = args.state {
            self.report.focus_state = state.clone();
        }
        if let Some(tier_a) = args.tier_a {
            self.report.tier_a = tier_a;
        }
        if let Some(tier_b) = args.tier_b {
            self.report.tier_b = tier_b;
        }

        self.report.focus_state = self.report.focus_state.trim().to_ascii_uppercase();
    }

    /// Check settings that would make the reports meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.report.focus_state.trim().is_empty() {
            bail!("Focus state must not be empty");
        }

        let brackets = crate::models::INCOME_BRACKETS;
        for (name, tier) in [("tier_a", self.report.tier_a), ("tier_b", self.report.tier_b)] {
            if !brackets.contains(&tier) {
                bail!(
                    "{} must be an income code between {} and {}, got {}",
                    name,
                    brackets.start(),
                    brackets.end(),
                    tier
                );
            }
        }

        if self.report.tier_a > self.report.tier_b {
            bail!(
                "tier_a ({}) must not exceed tier_b ({})",
                self.report.tier_a,
                self.report.tier_b
            );
        }

        if self.codes.classification.is_empty() && self.codes.activity.is_empty() {
            bail!("No codes of interest configured");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
