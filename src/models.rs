//! Data models for the report generator.
//!
//! This module contains the core data structures used throughout the
//! application: loaded records, breakdown keys, and the tables that are
//! eventually written out.

use crate::states;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Income bracket codes, in the order their columns are emitted.
pub const INCOME_BRACKETS: RangeInclusive<u8> = 0..=9;

/// Width of a single activity sub-code.
pub const ACTIVITY_CODE_WIDTH: usize = 3;

/// The three sub-codes carried by a compound activity field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityCodes([Option<String>; 3]);

impl ActivityCodes {
    /// Build from already sliced sub-codes.
    pub fn new(codes: [Option<String>; 3]) -> Self {
        Self(codes)
    }

    /// Returns true if any sub-code equals `code`.
    pub fn contains(&self, code: &str) -> bool {
        self.iter().any(|c| c == code)
    }

    /// Iterate over the present sub-codes, left to right.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().flatten().map(String::as_str)
    }

    /// Get the sub-code at `index` (0, 1 or 2).
    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|c| c.as_deref())
    }

    /// Returns true if no sub-code is present.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Concatenation of the present sub-codes.
    #[cfg(test)]
    pub fn joined(&self) -> String {
        self.iter().collect()
    }
}

/// One organization row.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// Raw field values, in header order.
    pub fields: Vec<String>,
    /// Primary classification (NTEE) code.
    pub classification: Option<String>,
    /// Compound activity code, as text.
    pub activity: Option<String>,
    /// Sub-codes derived from `activity`.
    pub activity_codes: ActivityCodes,
    /// State abbreviation.
    pub state: Option<String>,
    /// Income bracket code.
    pub income: Option<u8>,
}

impl Record {
    /// Creates a record from its parsed key columns, with no raw fields.
    pub fn new(
        classification: Option<&str>,
        activity: Option<&str>,
        state: Option<&str>,
        income: Option<u8>,
    ) -> Self {
        Self {
            fields: Vec::new(),
            classification: classification.map(String::from),
            activity: activity.map(String::from),
            activity_codes: ActivityCodes::default(),
            state: state.map(String::from),
            income,
        }
    }

    /// Attach raw field values.
    #[cfg(test)]
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Returns true if the classification code is exactly `code`.
    pub fn has_classification(&self, code: &str) -> bool {
        self.classification.as_deref() == Some(code)
    }

    /// Returns true if the record's state is exactly `state`.
    pub fn in_state(&self, state: &str) -> bool {
        self.state.as_deref() == Some(state)
    }
}

/// All loaded records, concatenated across input files.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    /// Shared header row.
    pub headers: Vec<String>,
    /// Records in file order, then row order.
    pub records: Vec<Record>,
    /// Files the records were read from.
    pub sources: Vec<PathBuf>,
}

impl Relation {
    /// Creates a relation from records with an empty header.
    #[cfg(test)]
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            headers: Vec::new(),
            records,
            sources: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow every record as a view.
    pub fn view(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    /// Distinct state values in first-encounter order.
    pub fn distinct_states(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.state.as_deref())
            .filter(|s| seen.insert(*s))
            .map(String::from)
            .collect()
    }
}

/// Geographic scope of a breakdown column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeographicScope {
    /// All rows.
    National,
    /// Rows whose state equals the abbreviation.
    State(String),
}

impl GeographicScope {
    pub fn admits(&self, record: &Record) -> bool {
        match self {
            GeographicScope::National => true,
            GeographicScope::State(abbr) => record.in_state(abbr),
        }
    }

    /// Column label for the scope ("National" or the state's display name).
    pub fn label(&self) -> String {
        match self {
            GeographicScope::National => "National".to_string(),
            GeographicScope::State(abbr) => states::label(abbr),
        }
    }
}

/// Income filter of a breakdown column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncomeFilter {
    /// Every row, including rows without an income code.
    Any,
    /// Rows in exactly this bracket.
    Exactly(u8),
    /// Rows at or above this bracket (inclusive).
    AtLeast(u8),
}

impl IncomeFilter {
    pub fn admits(&self, income: Option<u8>) -> bool {
        match (self, income) {
            (IncomeFilter::Any, _) => true,
            (IncomeFilter::Exactly(b), Some(i)) => i == *b,
            (IncomeFilter::AtLeast(t), Some(i)) => i >= *t,
            (_, None) => false,
        }
    }
}

impl fmt::Display for IncomeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncomeFilter::Any => Ok(()),
            IncomeFilter::Exactly(b) => write!(f, " Budget {}", b),
            IncomeFilter::AtLeast(t) => write!(f, " Budget {}+", t),
        }
    }
}

/// A (scope, income filter) pair identifying one count column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakdownKey {
    pub scope: GeographicScope,
    pub income: IncomeFilter,
}

impl BreakdownKey {
    pub fn new(scope: GeographicScope, income: IncomeFilter) -> Self {
        Self { scope, income }
    }

    /// Header label, e.g. "National", "Colorado Budget 3" or "Texas Budget 5+".
    pub fn label(&self) -> String {
        format!("{}{}", self.scope.label(), self.income)
    }
}

/// Counts for one code across every breakdown column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub code: String,
    pub counts: Vec<usize>,
}

/// A wide table of counts: one row per code, one column per breakdown key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    pub columns: Vec<BreakdownKey>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Look up a single cell.
    #[cfg(test)]
    pub fn get(&self, code: &str, key: &BreakdownKey) -> Option<usize> {
        let col = self.columns.iter().position(|c| c == key)?;
        self.rows
            .iter()
            .find(|r| r.code == code)
            .and_then(|r| r.counts.get(col).copied())
    }

    /// Header row: "code" followed by each column label.
    pub fn header(&self) -> Vec<String> {
        std::iter::once("code".to_string())
            .chain(self.columns.iter().map(BreakdownKey::label))
            .collect()
    }

    /// Flatten into a plain string table for writing.
    pub fn to_table(&self) -> Table {
        Table {
            headers: self.header(),
            rows: self
                .rows
                .iter()
                .map(|r| {
                    std::iter::once(r.code.clone())
                        .chain(r.counts.iter().map(|c| c.to_string()))
                        .collect()
                })
                .collect(),
        }
    }
}

/// A plain table of strings with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Data completeness figures over the whole relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualitySummary {
    /// Total number of rows.
    pub total: usize,
    /// Rows with neither a classification nor an activity code.
    pub missing_both: usize,
    /// Rows without a classification code.
    pub missing_classification: usize,
    /// Rows without an activity code.
    pub missing_activity: usize,
    /// Rows with both codes.
    pub both: usize,
    /// Rows with a classification code.
    pub classification_present: usize,
    /// Rows with an activity code.
    pub activity_present: usize,
}

/// Everything produced by one run, for the optional JSON summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// Input directory.
    pub input_dir: PathBuf,
    /// Input files, in load order.
    pub input_files: Vec<PathBuf>,
    /// Data completeness figures.
    pub data_quality: DataQualitySummary,
    /// Distinct states, in first-encounter order.
    pub states: Vec<String>,
    /// Files written.
    pub outputs: Vec<PathBuf>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(a: &str, b: &str, c: &str) -> ActivityCodes {
        ActivityCodes::new([Some(a.into()), Some(b.into()), Some(c.into())])
    }

    #[test]
    fn test_activity_codes_contains() {
        let ac = codes("150", "123", "456");
        assert!(ac.contains("150"));
        assert!(ac.contains("456"));
        assert!(!ac.contains("15"));
        assert!(!ActivityCodes::default().contains("150"));
    }

    #[test]
    fn test_income_filter_admits() {
        assert!(IncomeFilter::Any.admits(None));
        assert!(IncomeFilter::Any.admits(Some(0)));
        assert!(IncomeFilter::Exactly(3).admits(Some(3)));
        assert!(!IncomeFilter::Exactly(3).admits(Some(4)));
        assert!(IncomeFilter::AtLeast(5).admits(Some(5)));
        assert!(IncomeFilter::AtLeast(5).admits(Some(9)));
        assert!(!IncomeFilter::AtLeast(5).admits(Some(4)));
        assert!(!IncomeFilter::AtLeast(0).admits(None));
    }

    #[test]
    fn test_breakdown_labels() {
        let national = BreakdownKey::new(GeographicScope::National, IncomeFilter::Any);
        assert_eq!(national.label(), "National");

        let co = BreakdownKey::new(GeographicScope::State("CO".into()), IncomeFilter::Exactly(3));
        assert_eq!(co.label(), "Colorado Budget 3");

        let tx = BreakdownKey::new(GeographicScope::State("TX".into()), IncomeFilter::AtLeast(5));
        assert_eq!(tx.label(), "Texas Budget 5+");

        let unknown = BreakdownKey::new(GeographicScope::State("ZZ".into()), IncomeFilter::Any);
        assert_eq!(unknown.label(), "ZZ");
    }

    #[test]
    fn test_distinct_states_first_encounter_order() {
        let relation = Relation::from_records(vec![
            Record::new(None, None, Some("TX"), None),
            Record::new(None, None, Some("CO"), None),
            Record::new(None, None, None, None),
            Record::new(None, None, Some("TX"), None),
            Record::new(None, None, Some("AK"), None),
        ]);
        assert_eq!(relation.distinct_states(), vec!["TX", "CO", "AK"]);
    }

    #[test]
    fn test_summary_table_to_table() {
        let table = SummaryTable {
            columns: vec![
                BreakdownKey::new(GeographicScope::National, IncomeFilter::Any),
                BreakdownKey::new(GeographicScope::State("CO".into()), IncomeFilter::Any),
            ],
            rows: vec![SummaryRow {
                code: "J20".into(),
                counts: vec![2, 1],
            }],
        };

        let flat = table.to_table();
        assert_eq!(flat.headers, vec!["code", "National", "Colorado"]);
        assert_eq!(flat.rows, vec![vec!["J20", "2", "1"]]);

        let co = BreakdownKey::new(GeographicScope::State("CO".into()), IncomeFilter::Any);
        assert_eq!(table.get("J20", &co), Some(1));
        assert_eq!(table.get("Z99", &co), None);
    }
}
