/*!
 * Data type definitions for billing ledger records and derived summaries
 *
 * This module contains type-safe representations of the canonical ledger row
 * shape, the grouped financial summaries produced by aggregation, and the
 * selection/projection vocabulary shared across the pipeline.
 */

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

/// Procedure code - opaque alphanumeric identifier for a billed service
///
/// Always treated as text. Leading zeros and alphanumeric codes (CPT-style
/// identifiers like "99213" or "J0696") must survive ingestion verbatim, so
/// this type never exposes a numeric view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcedureCode(pub String);

impl ProcedureCode {
    /// Create a new procedure code, rejecting empty input
    pub fn new(code: String) -> Result<Self, crate::LedgerError> {
        if code.trim().is_empty() {
            return Err(crate::LedgerError::DataValidation {
                message: "Procedure code cannot be empty".to_string(),
                field: Some("procedure_code".to_string()),
                value: Some(code),
                context: Default::default(),
            });
        }
        Ok(ProcedureCode(code.trim().to_string()))
    }

    /// Get the code as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One billed-and-paid line item after normalization
///
/// Invariants upheld by the reader: `payer` is non-empty, `amount_paid` is
/// strictly positive (sign discarded, zero-paid rows dropped), `service_date`
/// parsed successfully. Records are immutable once built; every pipeline stage
/// produces a new filtered view rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub payer: String,
    pub procedure_code: ProcedureCode,
    pub procedure_description: String,
    pub service_date: NaiveDate,
    pub amount_paid: f64,
}

impl LedgerRecord {
    /// Grouping identity of this record
    pub fn procedure_key(&self) -> ProcedureKey {
        ProcedureKey {
            code: self.procedure_code.clone(),
            description: self.procedure_description.clone(),
        }
    }
}

/// Grouping identity: procedure code plus description
///
/// The description participates in the key. The same code billed under two
/// differing descriptions forms two distinct groups, reflecting description
/// drift in real ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcedureKey {
    pub code: ProcedureCode,
    pub description: String,
}

impl std::fmt::Display for ProcedureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} - {}", self.code, self.description)
        }
    }
}

/// Per-group financial summary for the current selection
///
/// `avg_paid` and `total_paid` are rounded to 1 decimal place at aggregation
/// time; `claim_count` is the raw record count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureGroupSummary {
    pub key: ProcedureKey,
    pub avg_paid: f64,
    pub total_paid: f64,
    pub claim_count: usize,
}

/// Rollup over all groups in the current selection
///
/// Computed from the already-rounded per-group values: `total_paid` is the
/// rounded sum of group totals, `avg_paid` the rounded mean of group averages
/// (not a reweighted mean over raw records), `claim_count` the sum of group
/// counts. `avg_paid` is `None` when no groups qualify; presentation layers
/// render that as a neutral placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrandTotal {
    pub avg_paid: Option<f64>,
    pub total_paid: f64,
    pub claim_count: usize,
}

impl GrandTotal {
    /// Rollup over an empty selection
    pub fn empty() -> Self {
        Self {
            avg_paid: None,
            total_paid: 0.0,
            claim_count: 0,
        }
    }
}

/// A row of the rendered summary: either a procedure group or the rollup
///
/// The rollup is a distinct variant rather than a same-shaped row with a magic
/// string key, so selection enumerations cannot include it by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryRow {
    Group(ProcedureGroupSummary),
    GrandTotal(GrandTotal),
}

/// Aggregation output: group summaries in first-seen order plus the rollup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub groups: Vec<ProcedureGroupSummary>,
    pub grand_total: GrandTotal,
}

impl SummaryTable {
    /// Summary table for an empty selection
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            grand_total: GrandTotal::empty(),
        }
    }

    /// Whether any group qualified
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find a group by its full key
    pub fn group(&self, key: &ProcedureKey) -> Option<&ProcedureGroupSummary> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Flatten into rows with the rollup appended once at the end
    pub fn rows(&self) -> Vec<SummaryRow> {
        let mut rows: Vec<SummaryRow> = self.groups.iter()
            .cloned()
            .map(SummaryRow::Group)
            .collect();
        rows.push(SummaryRow::GrandTotal(self.grand_total.clone()));
        rows
    }

    /// Selectable `(code, description)` pairs, rollup excluded by construction
    pub fn procedure_options(&self) -> Vec<&ProcedureKey> {
        self.groups.iter().map(|g| &g.key).collect()
    }
}

/// Payer selection: one specific payer or all payers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PayerChoice {
    #[default]
    All,
    One(String),
}

impl PayerChoice {
    /// Whether a record's payer matches this choice
    pub fn matches(&self, payer: &str) -> bool {
        match self {
            PayerChoice::All => true,
            PayerChoice::One(p) => p == payer,
        }
    }
}

impl std::fmt::Display for PayerChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayerChoice::All => write!(f, "All payers"),
            PayerChoice::One(p) => write!(f, "{}", p),
        }
    }
}

/// Inclusive date window over service dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, normalizing reversed bounds
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Whether a date falls inside the window, bounds inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Result of a revenue projection
///
/// `NoData` is a normal, expected outcome (e.g. a selection momentarily stale
/// relative to a changed date range) and must be rendered as a neutral
/// warning, never a crash.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionOutcome {
    Revenue(f64),
    NoData,
}

impl ProjectionOutcome {
    /// The projected revenue, if any
    pub fn revenue(&self) -> Option<f64> {
        match self {
            ProjectionOutcome::Revenue(r) => Some(*r),
            ProjectionOutcome::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ProjectionOutcome::NoData)
    }
}
