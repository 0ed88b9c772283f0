/*!
 * # Revest: billing ledger aggregation and revenue projection
 *
 * A Rust library for analyzing billed-procedure ledgers: how has a given
 * payer/procedure performed historically, and what would N additional
 * occurrences of a procedure be worth?
 *
 * ## Features
 *
 * - 📥 **Resilient Ingestion**: header names resolved case/space-insensitively
 *   across ledger revisions; bad rows are dropped and counted, never fatal
 * - 🔍 **Composable Filters**: inclusive date windows and payer selection
 * - 📊 **Deterministic Aggregation**: per-procedure averages, totals, and
 *   claim counts with a grand-total rollup
 * - 💰 **Revenue Projection**: historical average payment × hypothetical volume
 * - 💾 **Exports**: JSON, JSON Lines, and CSV summary output
 * - 🛡️ **Type Safe**: procedure codes stay opaque text; the rollup is a
 *   distinct variant that cannot leak into selection lists
 *
 * ## Quick Start
 *
 * ```no_run
 * use revest::prelude::*;
 *
 * # fn main() -> Result<()> {
 * // Load a billing ledger CSV
 * let dataset = LedgerDataset::load_csv("data/billing_ledger.csv")?;
 *
 * // Aggregate claims for one payer
 * let params = PipelineParams::all()
 *     .with_payer(PayerChoice::One("Medicare".to_string()));
 * let table = dataset.pipeline(&params);
 *
 * for group in &table.groups {
 *     println!("{}: avg ${:.1} over {} claims", group.key, group.avg_paid, group.claim_count);
 * }
 *
 * // Project revenue for 50 more occurrences of each procedure
 * for key in table.procedure_options() {
 *     match project(&table, key, 50) {
 *         ProjectionOutcome::Revenue(revenue) => println!("Projected: ${:.2}", revenue),
 *         ProjectionOutcome::NoData => println!("No data for that selection."),
 *     }
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Loading Data
 *
 * ```no_run
 * # use revest::prelude::*;
 * # fn main() -> Result<()> {
 * let dataset = LedgerDatasetBuilder::new()
 *     .ledger("data/billing_ledger.csv")
 *     .log_skipped(true)
 *     .build()?;
 *
 * println!("{} rows skipped during normalization", dataset.read_report.skipped());
 * # Ok(())
 * # }
 * ```
 *
 * ## The Pipeline
 *
 * Raw rows flow one way: normalization → time-window filter → payer selector
 * → aggregation → projection. Every stage is a pure transformation over an
 * immutable record set, and every parameter change re-runs the pipeline
 * wholesale, with no caches and no incremental state.
 *
 * ```no_run
 * # use revest::prelude::*;
 * # fn main() -> Result<()> {
 * # let dataset = LedgerDataset::load_csv("data/billing_ledger.csv")?;
 * let window = dataset.date_span().expect("ledger is not empty");
 * let table = dataset.pipeline(
 *     &PipelineParams::all().with_window(window)
 * );
 * println!("Grand total: ${:.1}", table.grand_total.total_paid);
 * # Ok(())
 * # }
 * ```
 */

// Re-export error types from root
pub use error::{LedgerError, Result, ErrorContext, ExportFormat};

// Public modules
pub mod data_types;
pub mod schema;
pub mod reader;
pub mod error;
pub mod analytics;
pub mod projection;
pub mod dataset;
pub mod export;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use revest::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::schema::{LedgerSchema, ColumnLayout};
    pub use crate::reader::{LedgerReader, ReadReport};
    pub use crate::error::{LedgerError, Result};
    pub use crate::analytics::{aggregate, LedgerAnalytics, LedgerQuery, LedgerStats};
    pub use crate::projection::{project, default_volume};
    pub use crate::dataset::{LedgerDataset, LedgerDatasetBuilder, PipelineParams};
    pub use crate::export::{SummaryExporter, JsonExporter, CsvExporter};
    pub use crate::config::{ConfigBuilder, LedgerConfig};
    pub use crate::ExportFormat;
}

/// Common recipes and utility functions
pub mod cookbook {
    use crate::prelude::*;
    use std::collections::HashMap;

    /// Groups of a summary table sorted by total paid, highest first
    ///
    /// Display ordering is a presentation concern; the aggregation engine
    /// itself keeps first-seen order.
    pub fn top_procedures_by_total(
        table: &SummaryTable,
        limit: usize,
    ) -> Vec<&ProcedureGroupSummary> {
        let mut groups: Vec<_> = table.groups.iter().collect();
        groups.sort_by(|a, b| {
            b.total_paid
                .partial_cmp(&a.total_paid)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        groups.truncate(limit);
        groups
    }

    /// Total paid per payer across the whole ledger
    pub fn revenue_by_payer(dataset: &LedgerDataset) -> HashMap<String, f64> {
        let mut totals = HashMap::new();

        for record in &dataset.records {
            *totals.entry(record.payer.clone()).or_insert(0.0) += record.amount_paid;
        }

        totals
    }

    /// One payer's summary over one window, in a single call
    pub fn payer_window_summary(
        dataset: &LedgerDataset,
        payer: &str,
        window: DateWindow,
    ) -> SummaryTable {
        dataset.pipeline(
            &PipelineParams::all()
                .with_window(window)
                .with_payer(PayerChoice::One(payer.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::data_types::{PayerChoice, ProcedureCode};

    #[test]
    fn test_procedure_code_validation() {
        assert!(ProcedureCode::new("99213".to_string()).is_ok());
        assert!(ProcedureCode::new("J0696".to_string()).is_ok());
        assert!(ProcedureCode::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_procedure_code_is_opaque_text() {
        let code = ProcedureCode::new("00420".to_string()).unwrap();
        assert_eq!(code.as_str(), "00420");
    }

    #[test]
    fn test_payer_choice_matching() {
        assert!(PayerChoice::All.matches("Medicare"));
        assert!(PayerChoice::One("Medicare".to_string()).matches("Medicare"));
        assert!(!PayerChoice::One("Medicare".to_string()).matches("Aetna"));
    }
}
