/*!
 * Unified dataset API for billing ledgers
 *
 * Provides a builder pattern for loading a ledger and a facade over the
 * filter → aggregate → project pipeline. Each call to
 * [`LedgerDataset::pipeline`] re-runs the whole pipeline over the shared,
 * immutable record set; there is no cached or incrementally-patched state.
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::{Result, LedgerError};
use crate::analytics::{aggregate, LedgerAnalytics, LedgerQuery, LedgerStats};
use crate::data_types::{
    DateWindow, LedgerRecord, PayerChoice, ProcedureKey, SummaryTable,
};
use crate::reader::{LedgerReader, ReadReport};

/// Filter parameters for one pipeline invocation
#[derive(Debug, Clone, Default)]
pub struct PipelineParams {
    /// Inclusive service-date window; `None` means the full span
    pub window: Option<DateWindow>,
    /// Payer selection; defaults to all payers
    pub payer: PayerChoice,
}

impl PipelineParams {
    /// Parameters selecting everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a date window
    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Restrict to a payer
    pub fn with_payer(mut self, payer: PayerChoice) -> Self {
        self.payer = payer;
        self
    }
}

/// Builder for loading a ledger dataset
///
/// # Example
/// ```no_run
/// # use revest::dataset::LedgerDatasetBuilder;
/// let dataset = LedgerDatasetBuilder::new()
///     .ledger("data/billing_ledger.csv")
///     .log_skipped(true)
///     .build()?;
/// # Ok::<(), revest::LedgerError>(())
/// ```
pub struct LedgerDatasetBuilder {
    ledger_path: Option<PathBuf>,
    log_skipped: bool,
    #[cfg(feature = "progress")]
    show_progress: bool,
}

impl Default for LedgerDatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerDatasetBuilder {
    /// Create a new dataset builder
    pub fn new() -> Self {
        Self {
            ledger_path: None,
            log_skipped: false,
            #[cfg(feature = "progress")]
            show_progress: true,
        }
    }

    /// Set the path to the ledger CSV file
    pub fn ledger<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.ledger_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable stderr logging of skipped rows
    pub fn log_skipped(mut self, log: bool) -> Self {
        self.log_skipped = log;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Build the dataset, loading the ledger file
    pub fn build(self) -> Result<LedgerDataset> {
        let path = self.ledger_path.ok_or_else(|| LedgerError::Custom {
            message: "Ledger file path not specified".to_string(),
            suggestion: Some("Use .ledger() to specify the billing ledger CSV file".to_string()),
        })?;

        let reader = LedgerReader::new().with_skip_log(self.log_skipped);

        #[cfg(feature = "progress")]
        let reader = reader.with_progress_bar(self.show_progress);

        let (records, read_report) = reader.load_ledger(&path)?;

        Ok(LedgerDataset {
            records,
            read_report,
        })
    }
}

/// A loaded billing ledger plus its ingestion report
#[derive(Debug)]
pub struct LedgerDataset {
    /// Normalized ledger records
    pub records: Vec<LedgerRecord>,
    /// Accounting of rows dropped during normalization
    pub read_report: ReadReport,
}

impl LedgerDataset {
    /// Wrap an already-materialized record collection
    ///
    /// Entry point for ingestion collaborators that are not CSV files; the
    /// records are assumed normalized.
    pub fn from_records(records: Vec<LedgerRecord>) -> Self {
        Self {
            records,
            read_report: ReadReport::default(),
        }
    }

    /// Load a ledger CSV file with default settings
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        LedgerDatasetBuilder::new().ledger(path).build()
    }

    /// Number of normalized records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create an analytics view over this ledger
    pub fn analytics(&self) -> LedgerAnalytics<'_> {
        LedgerAnalytics::new(&self.records)
    }

    /// Create a query builder over this ledger
    pub fn query(&self) -> LedgerQuery<'_> {
        LedgerQuery::new(&self.records)
    }

    /// Full span of service dates present
    pub fn date_span(&self) -> Option<DateWindow> {
        self.analytics().date_span()
    }

    /// Run the full pipeline for one set of filter parameters
    ///
    /// Pure function of `(records, params)`: time-window filter, payer
    /// selector, aggregation, rollup. Re-invoked wholesale on every parameter
    /// change.
    pub fn pipeline(&self, params: &PipelineParams) -> SummaryTable {
        let mut query = self.query();
        if let Some(window) = params.window {
            query = query.window(window);
        }
        query = query.payer(params.payer.clone());
        query.summarize()
    }

    /// Distinct payers present in the given window, sorted
    ///
    /// This is the enumeration a payer picker offers; `None` spans the whole
    /// ledger.
    pub fn selectable_payers(&self, window: Option<DateWindow>) -> Vec<String> {
        let payers: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| window.map_or(true, |w| w.contains(r.service_date)))
            .map(|r| r.payer.as_str())
            .collect();
        payers.into_iter().map(|p| p.to_string()).collect()
    }

    /// Selectable procedures for the given parameters, rollup excluded
    pub fn selectable_procedures(&self, params: &PipelineParams) -> Vec<ProcedureKey> {
        self.pipeline(params)
            .procedure_options()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Aggregate the whole ledger with no filter stages applied
    pub fn aggregate_all(&self) -> SummaryTable {
        aggregate(self.records.iter())
    }

    /// Ledger statistics
    pub fn statistics(&self) -> LedgerStats {
        self.analytics().ledger_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::ProcedureCode;
    use chrono::NaiveDate;

    fn record(payer: &str, code: &str, desc: &str, date: (i32, u32, u32), paid: f64) -> LedgerRecord {
        LedgerRecord {
            payer: payer.to_string(),
            procedure_code: ProcedureCode(code.to_string()),
            procedure_description: desc.to_string(),
            service_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            amount_paid: paid,
        }
    }

    fn dataset() -> LedgerDataset {
        LedgerDataset::from_records(vec![
            record("Medicare", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("Medicare", "99213", "Office Visit", (2024, 1, 10), 120.0),
            record("Aetna", "99285", "ER Visit", (2024, 2, 14), 412.4),
        ])
    }

    #[test]
    fn test_pipeline_window_and_payer() {
        let dataset = dataset();
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        let params = PipelineParams::all()
            .with_window(window)
            .with_payer(PayerChoice::One("Medicare".to_string()));

        let table = dataset.pipeline(&params);
        assert_eq!(table.groups.len(), 1);
        assert_eq!(table.groups[0].claim_count, 2);
        assert_eq!(table.groups[0].total_paid, 220.0);
    }

    #[test]
    fn test_selectable_payers_respect_window() {
        let dataset = dataset();
        let january = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert_eq!(dataset.selectable_payers(Some(january)), vec!["Medicare"]);
        assert_eq!(dataset.selectable_payers(None), vec!["Aetna", "Medicare"]);
    }

    #[test]
    fn test_selectable_procedures_exclude_rollup() {
        let dataset = dataset();
        let options = dataset.selectable_procedures(&PipelineParams::all());
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|k| !k.code.as_str().is_empty()));
    }

    #[test]
    fn test_pipeline_reruns_are_independent() {
        let dataset = dataset();
        let params = PipelineParams::all();
        let first = dataset.pipeline(&params);
        let second = dataset.pipeline(&params);
        assert_eq!(first, second);
        // The base record set is untouched by pipeline runs.
        assert_eq!(dataset.len(), 3);
    }
}
