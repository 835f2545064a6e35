//! Report table assembly.
//!
//! Arranges aggregator counts into the four report products: the activity
//! and classification bracket cross-tabs, the all-states cross-tab, and the
//! row-level extracts.

use crate::analysis::{breakdown_columns, cross_tab, CodeMatcher, Partitions};
use crate::config::Config;
use crate::models::{
    BreakdownKey, GeographicScope, IncomeFilter, Record, Relation, SummaryTable, Table,
    INCOME_BRACKETS,
};
use tracing::debug;

/// Everything the assembler needs besides the relation.
#[derive(Debug, Clone)]
pub struct ReportPlan {
    /// State used for the single-state columns and extracts.
    pub focus_state: String,
    /// First inclusive income threshold.
    pub tier_a: u8,
    /// Second inclusive income threshold.
    pub tier_b: u8,
    /// Classification codes, in row order.
    pub classification_codes: Vec<String>,
    /// Activity sub-codes, in row order.
    pub activity_codes: Vec<String>,
    /// Code lists for the extracts.
    pub extracts: ExtractPlan,
}

/// Code lists selecting extract rows.
#[derive(Debug, Clone, Default)]
pub struct ExtractPlan {
    pub state_classification: Vec<String>,
    pub state_activity: Vec<String>,
    pub national_classification: Vec<String>,
}

impl From<&Config> for ReportPlan {
    fn from(config: &Config) -> Self {
        Self {
            focus_state: config.report.focus_state.clone(),
            tier_a: config.report.tier_a,
            tier_b: config.report.tier_b,
            classification_codes: config.codes.classification.clone(),
            activity_codes: config.codes.activity.clone(),
            extracts: ExtractPlan {
                state_classification: config.extracts.state_classification.clone(),
                state_activity: config.extracts.state_activity.clone(),
                national_classification: config.extracts.national_classification.clone(),
            },
        }
    }
}

/// The four report products of one run.
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub activity: SummaryTable,
    pub classification: SummaryTable,
    pub all_states: SummaryTable,
    pub extracts: Table,
}

/// Build every report product.
pub fn assemble(relation: &Relation, plan: &ReportPlan) -> ReportSet {
    let partitions = Partitions::build(relation);

    let activity = activity_crosstab(&partitions, &plan.activity_codes, &plan.focus_state);
    debug!("Activity cross-tab: {} rows", activity.rows.len());

    let classification =
        classification_crosstab(&partitions, &plan.classification_codes, &plan.focus_state);
    debug!("Classification cross-tab: {} rows", classification.rows.len());

    let all_states = all_states_crosstab(
        &partitions,
        &plan.classification_codes,
        &plan.activity_codes,
        plan.tier_a,
        plan.tier_b,
    );
    debug!(
        "All-states cross-tab: {} rows x {} columns",
        all_states.rows.len(),
        all_states.columns.len()
    );

    let extracts = extracts(relation, &plan.extracts, &plan.focus_state);
    debug!("Extracts: {} rows", extracts.rows.len());

    ReportSet {
        activity,
        classification,
        all_states,
        extracts,
    }
}

/// National and focus-state totals, then each bracket nationally, then each
/// bracket in the focus state.
pub fn bracket_columns(focus_state: &str) -> Vec<BreakdownKey> {
    let national = GeographicScope::National;
    let state = GeographicScope::State(focus_state.to_string());
    let brackets: Vec<IncomeFilter> = INCOME_BRACKETS.map(IncomeFilter::Exactly).collect();

    let mut columns = breakdown_columns(&[national.clone(), state.clone()], &[IncomeFilter::Any]);
    columns.extend(breakdown_columns(&[national], &brackets));
    columns.extend(breakdown_columns(&[state], &brackets));
    columns
}

/// One row per activity code, bracket columns.
pub fn activity_crosstab(
    partitions: &Partitions<'_>,
    codes: &[String],
    focus_state: &str,
) -> SummaryTable {
    cross_tab(
        partitions,
        codes,
        CodeMatcher::Activity,
        &bracket_columns(focus_state),
    )
}

/// One row per classification code, bracket columns.
pub fn classification_crosstab(
    partitions: &Partitions<'_>,
    codes: &[String],
    focus_state: &str,
) -> SummaryTable {
    cross_tab(
        partitions,
        codes,
        CodeMatcher::Classification,
        &bracket_columns(focus_state),
    )
}

/// National total, then per observed state: total, >= tier A, >= tier B.
pub fn all_states_columns(
    partitions: &Partitions<'_>,
    tier_a: u8,
    tier_b: u8,
) -> Vec<BreakdownKey> {
    let states: Vec<GeographicScope> = partitions
        .states()
        .map(|s| GeographicScope::State(s.to_string()))
        .collect();

    let mut columns = vec![BreakdownKey::new(
        GeographicScope::National,
        IncomeFilter::Any,
    )];
    columns.extend(breakdown_columns(
        &states,
        &[
            IncomeFilter::Any,
            IncomeFilter::AtLeast(tier_a),
            IncomeFilter::AtLeast(tier_b),
        ],
    ));
    columns
}

/// Classification code rows followed by activity code rows.
pub fn all_states_crosstab(
    partitions: &Partitions<'_>,
    classification_codes: &[String],
    activity_codes: &[String],
    tier_a: u8,
    tier_b: u8,
) -> SummaryTable {
    let columns = all_states_columns(partitions, tier_a, tier_b);

    let mut table = cross_tab(
        partitions,
        classification_codes,
        CodeMatcher::Classification,
        &columns,
    );
    table
        .rows
        .extend(cross_tab(partitions, activity_codes, CodeMatcher::Activity, &columns).rows);
    table
}

/// Row subsets copied into the extracts file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    /// Classification code in list, focus state only.
    StateClassification,
    /// Activity sub-code in list, focus state only.
    StateActivity,
    /// Classification code in list, all states.
    NationalClassification,
}

impl ExtractKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExtractKind::StateClassification => "state_classification",
            ExtractKind::StateActivity => "state_activity",
            ExtractKind::NationalClassification => "national_classification",
        }
    }

    fn matcher(&self) -> CodeMatcher {
        match self {
            ExtractKind::StateClassification | ExtractKind::NationalClassification => {
                CodeMatcher::Classification
            }
            ExtractKind::StateActivity => CodeMatcher::Activity,
        }
    }

    fn scope(&self, focus_state: &str) -> GeographicScope {
        match self {
            ExtractKind::NationalClassification => GeographicScope::National,
            _ => GeographicScope::State(focus_state.to_string()),
        }
    }
}

/// Records of one extract subset, in relation order.
pub fn select_extract<'a>(
    relation: &'a Relation,
    kind: ExtractKind,
    codes: &[String],
    focus_state: &str,
) -> Vec<&'a Record> {
    let matcher = kind.matcher();
    let scope = kind.scope(focus_state);
    relation
        .records
        .iter()
        .filter(|r| scope.admits(r))
        .filter(|r| codes.iter().any(|c| matcher.matches(r, c)))
        .collect()
}

/// All three extract subsets, each row prefixed with its subset label.
pub fn extracts(relation: &Relation, plan: &ExtractPlan, focus_state: &str) -> Table {
    let subsets = [
        (ExtractKind::StateClassification, &plan.state_classification),
        (ExtractKind::StateActivity, &plan.state_activity),
        (
            ExtractKind::NationalClassification,
            &plan.national_classification,
        ),
    ];

    let headers = std::iter::once("extract".to_string())
        .chain(relation.headers.iter().cloned())
        .collect();

    let rows = subsets
        .iter()
        .flat_map(|(kind, codes)| {
            select_extract(relation, *kind, codes, focus_state)
                .into_iter()
                .map(move |record| {
                    std::iter::once(kind.label().to_string())
                        .chain(record.fields.iter().cloned())
                        .collect()
                })
        })
        .collect();

    Table { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::apply_activity_split;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn record(
        id: &str,
        ntee: Option<&str>,
        activity: Option<&str>,
        state: &str,
        income: u8,
    ) -> Record {
        Record::new(ntee, activity, Some(state), Some(income)).with_fields(vec![
            id.to_string(),
            state.to_string(),
            ntee.unwrap_or("").to_string(),
        ])
    }

    fn sample() -> Relation {
        let mut relation = Relation {
            headers: codes(&["EIN", "STATE", "NTEE_CD"]),
            records: vec![
                record("1", Some("J20"), Some("150123000"), "CO", 5),
                record("2", Some("J20"), None, "CO", 3),
                record("3", Some("B30"), Some("123150150"), "TX", 7),
                record("4", Some("J30"), None, "TX", 9),
                record("5", None, Some("150"), "CO", 0),
            ],
            sources: Vec::new(),
        };
        apply_activity_split(&mut relation);
        relation
    }

    fn plan() -> ReportPlan {
        ReportPlan {
            focus_state: "CO".to_string(),
            tier_a: 5,
            tier_b: 7,
            classification_codes: codes(&["J20", "J30", "Z99"]),
            activity_codes: codes(&["150", "123"]),
            extracts: ExtractPlan {
                state_classification: codes(&["J20"]),
                state_activity: codes(&["150"]),
                national_classification: codes(&["J30", "B30"]),
            },
        }
    }

    #[test]
    fn test_bracket_columns_layout() {
        let labels: Vec<String> = bracket_columns("CO").iter().map(BreakdownKey::label).collect();

        assert_eq!(labels.len(), 22);
        assert_eq!(labels[0], "National");
        assert_eq!(labels[1], "Colorado");
        assert_eq!(labels[2], "National Budget 0");
        assert_eq!(labels[11], "National Budget 9");
        assert_eq!(labels[12], "Colorado Budget 0");
        assert_eq!(labels[21], "Colorado Budget 9");
    }

    #[test]
    fn test_classification_crosstab() {
        let relation = sample();
        let partitions = Partitions::build(&relation);
        let table = classification_crosstab(&partitions, &plan().classification_codes, "CO");

        let j20 = &table.rows[0];
        assert_eq!(j20.code, "J20");
        // National, Colorado, then brackets 0..9 nationally, then in Colorado.
        assert_eq!(j20.counts[0], 2);
        assert_eq!(j20.counts[1], 2);
        assert_eq!(j20.counts[2 + 3], 1);
        assert_eq!(j20.counts[2 + 5], 1);
        assert_eq!(j20.counts[12 + 5], 1);

        let z99 = &table.rows[2];
        assert!(z99.counts.iter().all(|c| *c == 0));
    }

    #[test]
    fn test_activity_crosstab() {
        let relation = sample();
        let partitions = Partitions::build(&relation);
        let table = activity_crosstab(&partitions, &plan().activity_codes, "CO");

        let code_150 = &table.rows[0];
        assert_eq!(code_150.code, "150");
        assert_eq!(code_150.counts[0], 3);
        assert_eq!(code_150.counts[1], 2);
        assert_eq!(code_150.counts[2], 1);
        assert_eq!(code_150.counts[2 + 7], 1);

        let code_123 = &table.rows[1];
        assert_eq!(code_123.counts[0], 2);
        assert_eq!(code_123.counts[1], 1);
    }

    #[test]
    fn test_all_states_crosstab() {
        let relation = sample();
        let partitions = Partitions::build(&relation);
        let plan = plan();
        let table = all_states_crosstab(
            &partitions,
            &plan.classification_codes,
            &plan.activity_codes,
            plan.tier_a,
            plan.tier_b,
        );

        assert_eq!(
            table.header(),
            vec![
                "code",
                "National",
                "Colorado",
                "Colorado Budget 5+",
                "Colorado Budget 7+",
                "Texas",
                "Texas Budget 5+",
                "Texas Budget 7+",
            ]
        );

        let order: Vec<&str> = table.rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(order, vec!["J20", "J30", "Z99", "150", "123"]);

        assert_eq!(table.rows[0].counts, vec![2, 2, 1, 0, 0, 0, 0]);
        assert_eq!(table.rows[1].counts, vec![1, 0, 0, 0, 1, 1, 1]);
        assert_eq!(table.rows[3].counts, vec![3, 2, 1, 0, 1, 1, 1]);
    }

    #[test]
    fn test_all_states_crosstab_stateless_row() {
        let relation = Relation::from_records(vec![
            Record::new(Some("J20"), None, None, Some(5)),
            Record::new(Some("J20"), None, Some("CO"), Some(5)),
        ]);
        let partitions = Partitions::build(&relation);
        let table = all_states_crosstab(&partitions, &codes(&["J20"]), &[], 5, 7);

        assert_eq!(
            table.header(),
            vec![
                "code",
                "National",
                "Colorado",
                "Colorado Budget 5+",
                "Colorado Budget 7+",
            ]
        );
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].counts, vec![2, 1, 1, 0]);
    }

    #[test]
    fn test_extracts() {
        let relation = sample();
        let table = extracts(&relation, &plan().extracts, "CO");

        assert_eq!(table.headers, vec!["extract", "EIN", "STATE", "NTEE_CD"]);

        let summary: Vec<(&str, &str)> = table
            .rows
            .iter()
            .map(|r| (r[0].as_str(), r[1].as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("state_classification", "1"),
                ("state_classification", "2"),
                ("state_activity", "1"),
                ("state_activity", "5"),
                ("national_classification", "3"),
                ("national_classification", "4"),
            ]
        );
    }

    #[test]
    fn test_assemble() {
        let relation = sample();
        let reports = assemble(&relation, &plan());

        assert_eq!(reports.activity.rows.len(), 2);
        assert_eq!(reports.classification.rows.len(), 3);
        assert_eq!(reports.all_states.rows.len(), 5);
        assert_eq!(reports.extracts.rows.len(), 6);
    }
}
