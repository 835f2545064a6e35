//! ntee-report - cross-tab counts over IRS exempt organization extracts
//!
//! A CLI tool that loads a directory of CSV extracts, splits the compound
//! activity field, and writes count tables by classification code,
//! activity code, state and income bracket.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, config, input or output)

mod analysis;
mod cli;
mod config;
mod loader;
mod models;
mod report;
mod states;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use loader::{InputLoader, LoadConfig};
use models::{DataQualitySummary, Relation, RunSummary};
use report::ReportPlan;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ntee-report v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_report(args) {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .ntee-report.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize code lists, columns, thresholds and file names.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow.
fn run_report(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    // Step 1: Load every extract file
    println!("📥 Loading extracts from: {}", args.input.display());
    let loader = InputLoader::new(args.input.clone(), LoadConfig::from(&config.input));
    let mut relation = loader
        .load(!args.quiet)
        .with_context(|| format!("Failed to load input from {}", args.input.display()))?;

    // Step 2: Derive activity sub-codes
    analysis::apply_activity_split(&mut relation);

    let quality = analysis::data_quality(&relation);
    info!(
        "Records: {} | missing both: {} | missing classification: {} | missing activity: {}",
        quality.total,
        quality.missing_both,
        quality.missing_classification,
        quality.missing_activity
    );

    if relation.is_empty() {
        warn!("Input files contain no data rows; every count will be zero");
    }

    // Handle --dry-run: report completeness and exit
    if args.dry_run {
        return handle_dry_run(&relation, &quality, &config);
    }

    // Step 3: Build every table before writing any of them
    println!("\n🧮 Building cross-tabs...");
    println!("   Focus state: {}", states::label(&config.report.focus_state));
    println!(
        "   Income tiers: >= {} and >= {}",
        config.report.tier_a, config.report.tier_b
    );

    let plan = ReportPlan::from(&config);
    let reports = report::assemble(&relation, &plan);

    // Step 4: Write the reports
    println!("\n📝 Writing reports...");
    let outputs = report::write_report_set(&reports, &args.output, &config.report.files)?;

    let duration = start_time.elapsed().as_secs_f64();

    if let Some(ref summary_path) = args.summary {
        let summary = RunSummary {
            generated_at: Utc::now(),
            input_dir: args.input.clone(),
            input_files: relation.sources.clone(),
            data_quality: quality.clone(),
            states: relation.distinct_states(),
            outputs: outputs.clone(),
            duration_seconds: duration,
        };
        report::write_json_summary(&summary, summary_path)?;
        println!("   📄 {}", summary_path.display());
    }

    // Print summary
    println!("\n📊 Report Summary:");
    println!("   Input files: {}", relation.sources.len());
    println!("   Records: {}", relation.len());
    println!("   States found: {}", relation.distinct_states().len());
    println!(
        "   Codes: {} classification | {} activity",
        plan.classification_codes.len(),
        plan.activity_codes.len()
    );
    println!("   Extract rows: {}", reports.extracts.rows.len());
    for path in &outputs {
        println!("   📄 {}", path.display());
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Reports complete! Written to: {}", args.output.display());

    Ok(())
}

/// Handle --dry-run: print what was loaded, write nothing.
fn handle_dry_run(
    relation: &Relation,
    quality: &DataQualitySummary,
    config: &Config,
) -> Result<()> {
    println!("\n🔍 Dry run: input loaded, no reports written.\n");

    for source in &relation.sources {
        println!("     📄 {}", source.display());
    }
    println!("\n{}", analysis::generate_summary_text(quality));

    let rows = relation.view();

    println!("\nNational counts by code:");
    for code in &config.codes.classification {
        println!("   {}: {}", code, analysis::count_by_code(&rows, code));
    }
    for code in &config.codes.activity {
        println!("   {} (activity): {}", code, analysis::count_by_activity(&rows, code));
    }

    println!("\nRecords by income code:");
    for bracket in models::INCOME_BRACKETS {
        println!(
            "   {}: {}",
            bracket,
            analysis::count_by_income_bracket(&rows, bracket)
        );
    }

    let states = relation.distinct_states();
    println!("\nStates found: {}", states.len());
    if !states.is_empty() {
        println!("   {}", states.join(", "));
    }

    println!("\n✅ Dry run complete.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn test_end_to_end_on_fixtures() {
        let out = TempDir::new().unwrap();
        let args = Args {
            input: fixtures_dir().join("data"),
            output: out.path().to_path_buf(),
            config: Some(fixtures_dir().join("ntee-report.toml")),
            state: None,
            tier_a: None,
            tier_b: None,
            summary: Some(out.path().join("summary.json")),
            verbose: false,
            quiet: true,
            dry_run: false,
            init_config: false,
        };

        run_report(args).unwrap();

        let classification =
            std::fs::read_to_string(out.path().join("classification_crosstab.csv")).unwrap();
        let mut lines = classification.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("code,National,Colorado,National Budget 0,"));
        assert!(header.ends_with(",Colorado Budget 9"));
        assert!(lines.next().unwrap().starts_with("J20,3,2,"));

        let all_states =
            std::fs::read_to_string(out.path().join("all_states_crosstab.csv")).unwrap();
        assert!(all_states
            .lines()
            .next()
            .unwrap()
            .starts_with("code,National,Colorado,Colorado Budget 5+,Colorado Budget 6+,Texas,"));

        let extracts = std::fs::read_to_string(out.path().join("extracts.csv")).unwrap();
        assert!(extracts.starts_with("extract,EIN,NAME,STATE,NTEE_CD,ACTIVITY,INCOME_CD\n"));

        let summary = std::fs::read_to_string(out.path().join("summary.json")).unwrap();
        assert!(summary.contains("\"total\": 12"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let out = TempDir::new().unwrap();
        let args = Args {
            input: fixtures_dir().join("data"),
            output: out.path().join("reports"),
            config: Some(fixtures_dir().join("ntee-report.toml")),
            state: None,
            tier_a: None,
            tier_b: None,
            summary: None,
            verbose: false,
            quiet: true,
            dry_run: true,
            init_config: false,
        };

        run_report(args).unwrap();
        assert!(!out.path().join("reports").exists());
    }
}
