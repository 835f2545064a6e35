//! Record counting and cross-tabulation.
//!
//! Every count is a stateless filter-and-count over a view of the
//! relation. [`Partitions`] pre-filters the relation once per state so the
//! cross-tab builders do not rescan every record for every cell.

use crate::models::{
    BreakdownKey, DataQualitySummary, GeographicScope, IncomeFilter, Record, Relation,
    SummaryRow, SummaryTable,
};
use super::splitter::is_missing_activity;
use std::collections::HashMap;
use tracing::debug;

/// Which field a code is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMatcher {
    /// Exact match on the primary classification code.
    Classification,
    /// Match on any of the three activity sub-codes.
    Activity,
}

impl CodeMatcher {
    pub fn matches(&self, record: &Record, code: &str) -> bool {
        match self {
            CodeMatcher::Classification => record.has_classification(code),
            CodeMatcher::Activity => record.activity_codes.contains(code),
        }
    }

    /// Count rows matching `code`.
    pub fn count(&self, rows: &[&Record], code: &str) -> usize {
        rows.iter().filter(|r| self.matches(r, code)).count()
    }
}

/// Number of rows whose classification code equals `code`.
pub fn count_by_code(rows: &[&Record], code: &str) -> usize {
    CodeMatcher::Classification.count(rows, code)
}

/// Number of rows carrying `code` in any activity sub-field.
///
/// A row with the code in more than one sub-field counts once.
pub fn count_by_activity(rows: &[&Record], code: &str) -> usize {
    CodeMatcher::Activity.count(rows, code)
}

/// Number of rows in exactly this income bracket.
pub fn count_by_income_bracket(rows: &[&Record], bracket: u8) -> usize {
    rows.iter().filter(|r| r.income == Some(bracket)).count()
}

/// Rows admitted by an income filter.
pub fn filter_income<'a>(rows: &[&'a Record], income: IncomeFilter) -> Vec<&'a Record> {
    rows.iter()
        .copied()
        .filter(|r| income.admits(r.income))
        .collect()
}

/// Views of the relation pre-filtered by geographic scope.
#[derive(Debug, Clone, Default)]
pub struct Partitions<'a> {
    national: Vec<&'a Record>,
    by_state: Vec<(String, Vec<&'a Record>)>,
}

impl<'a> Partitions<'a> {
    /// Partition every record by state, keeping first-encounter order.
    pub fn build(relation: &'a Relation) -> Self {
        Self::from_rows(relation.view())
    }

    pub fn from_rows(rows: Vec<&'a Record>) -> Self {
        let mut by_state: Vec<(String, Vec<&'a Record>)> = Vec::new();
        let mut index: HashMap<&'a str, usize> = HashMap::new();

        for &record in &rows {
            let Some(state) = record.state.as_deref() else {
                continue;
            };
            match index.get(state) {
                Some(&i) => by_state[i].1.push(record),
                None => {
                    index.insert(state, by_state.len());
                    by_state.push((state.to_string(), vec![record]));
                }
            }
        }

        debug!(
            "Partitioned {} records into {} states",
            rows.len(),
            by_state.len()
        );

        Self {
            national: rows,
            by_state,
        }
    }

    /// Every record.
    pub fn national(&self) -> &[&'a Record] {
        &self.national
    }

    /// Records for one state; empty if the state never appears.
    pub fn state(&self, abbr: &str) -> &[&'a Record] {
        self.by_state
            .iter()
            .find(|(s, _)| s == abbr)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    /// States in first-encounter order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.by_state.iter().map(|(s, _)| s.as_str())
    }

    /// Records for a geographic scope.
    pub fn scope(&self, scope: &GeographicScope) -> &[&'a Record] {
        match scope {
            GeographicScope::National => self.national(),
            GeographicScope::State(abbr) => self.state(abbr),
        }
    }

    /// Records admitted by a breakdown key.
    pub fn select(&self, key: &BreakdownKey) -> Vec<&'a Record> {
        filter_income(self.scope(&key.scope), key.income)
    }
}

/// Every (scope, income) combination, scope-major.
pub fn breakdown_columns(
    scopes: &[GeographicScope],
    incomes: &[IncomeFilter],
) -> Vec<BreakdownKey> {
    scopes
        .iter()
        .flat_map(|scope| {
            incomes
                .iter()
                .map(move |income| BreakdownKey::new(scope.clone(), *income))
        })
        .collect()
}

/// Count every code against every breakdown column.
///
/// Rows follow the order of `codes`, columns the order of `columns`.
pub fn cross_tab(
    partitions: &Partitions<'_>,
    codes: &[String],
    matcher: CodeMatcher,
    columns: &[BreakdownKey],
) -> SummaryTable {
    let views: Vec<Vec<&Record>> = columns.iter().map(|key| partitions.select(key)).collect();

    let rows = codes
        .iter()
        .map(|code| SummaryRow {
            code: code.clone(),
            counts: views.iter().map(|view| matcher.count(view, code)).collect(),
        })
        .collect();

    SummaryTable {
        columns: columns.to_vec(),
        rows,
    }
}

/// Completeness figures for the classification and activity fields.
pub fn data_quality(relation: &Relation) -> DataQualitySummary {
    let mut summary = DataQualitySummary {
        total: relation.len(),
        ..Default::default()
    };

    for record in &relation.records {
        let has_classification = record.classification.is_some();
        let has_activity = !record
            .activity
            .as_deref()
            .map_or(true, is_missing_activity);

        match (has_classification, has_activity) {
            (true, true) => summary.both += 1,
            (false, false) => summary.missing_both += 1,
            _ => {}
        }
        if has_classification {
            summary.classification_present += 1;
        } else {
            summary.missing_classification += 1;
        }
        if has_activity {
            summary.activity_present += 1;
        } else {
            summary.missing_activity += 1;
        }
    }

    summary
}

/// Generate a text summary of data completeness.
pub fn generate_summary_text(summary: &DataQualitySummary) -> String {
    [
        format!("Total records: {}", summary.total),
        format!("- Missing both codes: {}", summary.missing_both),
        format!("- Missing classification: {}", summary.missing_classification),
        format!("- Missing activity: {}", summary.missing_activity),
        format!("- Both codes: {}", summary.both),
        format!("- Classification present: {}", summary.classification_present),
        format!("- Activity present: {}", summary.activity_present),
    ]
    .join("\n")
}
