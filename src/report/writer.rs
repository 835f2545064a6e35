//! Report file output.
//!
//! Tables are written as CSV with a header row; the optional run summary
//! is written as pretty-printed JSON.

use crate::config::OutputFiles;
use crate::models::{RunSummary, Table};
use crate::report::ReportSet;
use anyhow::{Context, Result};
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialize a table to any writer as CSV.
pub fn write_table_to<W: Write>(table: &Table, writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(&table.headers)
        .context("Failed to write CSV header")?;
    for (i, row) in table.rows.iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("Failed to write CSV row #{}", i + 1))?;
    }
    wtr.flush()?;

    Ok(table.rows.len())
}

/// Write a table to a CSV file, creating parent directories.
///
/// Returns the number of data rows written.
pub fn write_table(table: &Table, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let rows = write_table_to(table, file)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

/// Write all four report products into `output_dir`.
///
/// Returns the paths written, in product order.
pub fn write_report_set(
    reports: &ReportSet,
    output_dir: &Path,
    files: &OutputFiles,
) -> Result<Vec<PathBuf>> {
    let products = [
        (reports.activity.to_table(), &files.activity),
        (reports.classification.to_table(), &files.classification),
        (reports.all_states.to_table(), &files.all_states),
        (reports.extracts.clone(), &files.extracts),
    ];

    let mut written = Vec::with_capacity(products.len());
    for (table, name) in &products {
        let path = output_dir.join(name);
        write_table(table, &path)?;
        written.push(path);
    }

    Ok(written)
}

/// Generate the JSON run summary.
pub fn generate_json_summary(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}

/// Write the JSON run summary to a file.
pub fn write_json_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let content = generate_json_summary(summary)?;

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BreakdownKey, DataQualitySummary, GeographicScope, IncomeFilter, SummaryRow, SummaryTable,
    };
    use chrono::Utc;
    use tempfile::TempDir;

    fn summary_table() -> SummaryTable {
        SummaryTable {
            columns: vec![
                BreakdownKey::new(GeographicScope::National, IncomeFilter::Any),
                BreakdownKey::new(GeographicScope::State("CO".into()), IncomeFilter::AtLeast(5)),
            ],
            rows: vec![
                SummaryRow {
                    code: "J20".into(),
                    counts: vec![2, 1],
                },
                SummaryRow {
                    code: "Z99".into(),
                    counts: vec![0, 0],
                },
            ],
        }
    }

    fn report_set() -> ReportSet {
        ReportSet {
            activity: summary_table(),
            classification: summary_table(),
            all_states: summary_table(),
            extracts: Table {
                headers: vec!["extract".into(), "EIN".into(), "NAME".into()],
                rows: vec![vec![
                    "state_classification".into(),
                    "1".into(),
                    "Alpha, Inc.".into(),
                ]],
            },
        }
    }

    #[test]
    fn test_write_table_to() {
        let mut buf = Vec::new();
        let rows = write_table_to(&summary_table().to_table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(
            text,
            "code,National,Colorado Budget 5+\nJ20,2,1\nZ99,0,0\n"
        );
    }

    #[test]
    fn test_write_table_quotes_fields() {
        let mut buf = Vec::new();
        write_table_to(&report_set().extracts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("\"Alpha, Inc.\""));
    }

    #[test]
    fn test_write_report_set() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports");
        let files = OutputFiles::default();

        let written = write_report_set(&report_set(), &out, &files).unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(written[0], out.join("activity_crosstab.csv"));
        assert!(written.iter().all(|p| p.exists()));

        let extracts = std::fs::read_to_string(out.join("extracts.csv")).unwrap();
        assert!(extracts.starts_with("extract,EIN,NAME\n"));
    }

    #[test]
    fn test_generate_json_summary() {
        let summary = RunSummary {
            generated_at: Utc::now(),
            input_dir: PathBuf::from("data"),
            input_files: vec![PathBuf::from("data/eo_co.csv")],
            data_quality: DataQualitySummary {
                total: 3,
                ..Default::default()
            },
            states: vec!["CO".into()],
            outputs: vec![],
            duration_seconds: 0.5,
        };

        let json = generate_json_summary(&summary).unwrap();
        assert!(json.contains("\"generated_at\""));
        assert!(json.contains("\"missing_both\""));
        assert!(json.contains("\"total\": 3"));
    }
}
