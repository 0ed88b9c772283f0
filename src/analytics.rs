/*!
 * Filtering and aggregation for billing ledger records
 *
 * This module holds the deterministic core of the pipeline: the time-window
 * and payer filters, the grouping of qualifying records by procedure
 * identity, and the grand-total rollup.
 *
 * Rounding rule: per-group `avg_paid` and `total_paid` are rounded to one
 * decimal place with `f64::round` semantics (half away from zero; amounts are
 * non-negative after normalization, so this is round-half-up). The rollup is
 * computed from the already-rounded per-group values (sum of rounded totals,
 * mean of rounded averages), which is the observed ledger-report behavior and
 * is reproduced as-is rather than reaggregated from raw records.
 */

use std::collections::{HashMap, HashSet};

use crate::data_types::{
    DateWindow, GrandTotal, LedgerRecord, PayerChoice, ProcedureGroupSummary, ProcedureKey,
    SummaryTable,
};

/// Round to one decimal place, half away from zero
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Group qualifying records by procedure identity and compute the rollup
///
/// Groups appear in first-seen order, every distinct `(code, description)`
/// key exactly once. Empty input yields no groups and an empty rollup whose
/// average is undefined.
pub fn aggregate<'a, I>(records: I) -> SummaryTable
where
    I: IntoIterator<Item = &'a LedgerRecord>,
{
    struct Accumulator {
        key: ProcedureKey,
        sum: f64,
        count: usize,
    }

    let mut order: Vec<Accumulator> = Vec::new();
    let mut index: HashMap<ProcedureKey, usize> = HashMap::new();

    for record in records {
        let key = record.procedure_key();
        match index.get(&key) {
            Some(&idx) => {
                let acc = &mut order[idx];
                acc.sum += record.amount_paid;
                acc.count += 1;
            }
            None => {
                index.insert(key.clone(), order.len());
                order.push(Accumulator {
                    key,
                    sum: record.amount_paid,
                    count: 1,
                });
            }
        }
    }

    if order.is_empty() {
        return SummaryTable::empty();
    }

    let groups: Vec<ProcedureGroupSummary> = order
        .into_iter()
        .map(|acc| ProcedureGroupSummary {
            avg_paid: round1(acc.sum / acc.count as f64),
            total_paid: round1(acc.sum),
            claim_count: acc.count,
            key: acc.key,
        })
        .collect();

    // Rollup over the rounded per-group values, not the raw records.
    let total_paid = round1(groups.iter().map(|g| g.total_paid).sum());
    let avg_paid = round1(
        groups.iter().map(|g| g.avg_paid).sum::<f64>() / groups.len() as f64,
    );
    let claim_count = groups.iter().map(|g| g.claim_count).sum();

    SummaryTable {
        groups,
        grand_total: GrandTotal {
            avg_paid: Some(avg_paid),
            total_paid,
            claim_count,
        },
    }
}

/// Analytics view over a slice of normalized ledger records
pub struct LedgerAnalytics<'a> {
    records: &'a [LedgerRecord],
}

impl<'a> LedgerAnalytics<'a> {
    /// Create a new analytics view
    pub fn new(records: &'a [LedgerRecord]) -> Self {
        Self { records }
    }

    /// Full span of service dates present, i.e. the pickable window bounds
    pub fn date_span(&self) -> Option<DateWindow> {
        let mut dates = self.records.iter().map(|r| r.service_date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(min, max), d| {
            (min.min(d), max.max(d))
        });
        Some(DateWindow::new(min, max))
    }

    /// Distinct payers present, sorted
    pub fn distinct_payers(&self) -> Vec<String> {
        let mut payers: Vec<String> = self
            .records
            .iter()
            .map(|r| r.payer.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        payers.sort();
        payers
    }

    /// Records whose service date falls inside the window, order preserved
    pub fn between(&self, window: DateWindow) -> Vec<&'a LedgerRecord> {
        self.records
            .iter()
            .filter(|r| window.contains(r.service_date))
            .collect()
    }

    /// Records matching the payer choice, order preserved
    ///
    /// A payer absent from the record set yields an empty result, not an
    /// error.
    pub fn for_payer(&self, choice: &PayerChoice) -> Vec<&'a LedgerRecord> {
        self.records
            .iter()
            .filter(|r| choice.matches(&r.payer))
            .collect()
    }

    /// Aggregate every record in the view
    pub fn aggregate(&self) -> SummaryTable {
        aggregate(self.records.iter())
    }

    /// Basic statistics about the ledger
    pub fn ledger_stats(&self) -> LedgerStats {
        let total_claims = self.records.len();
        let unique_payers = self
            .records
            .iter()
            .map(|r| r.payer.as_str())
            .collect::<HashSet<_>>()
            .len();
        let unique_procedures = self
            .records
            .iter()
            .map(|r| r.procedure_key())
            .collect::<HashSet<_>>()
            .len();
        let total_paid = self.records.iter().map(|r| r.amount_paid).sum();

        LedgerStats {
            total_claims,
            unique_payers,
            unique_procedures,
            total_paid,
            span: self.date_span(),
        }
    }
}

/// Statistics about a ledger record set
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub total_claims: usize,
    pub unique_payers: usize,
    pub unique_procedures: usize,
    pub total_paid: f64,
    pub span: Option<DateWindow>,
}

impl LedgerStats {
    /// Print formatted statistics
    pub fn print_summary(&self) {
        println!("=== Ledger Statistics ===");
        println!("Total Claims: {}", self.total_claims);
        println!("Unique Payers: {}", self.unique_payers);
        println!("Unique Procedures: {}", self.unique_procedures);
        println!("Total Paid: ${:.2}", self.total_paid);
        match self.span {
            Some(window) => println!("Service Dates: {} to {}", window.start, window.end),
            None => println!("Service Dates: (none)"),
        }
    }
}

/// Query builder composing filter stages over a ledger
///
/// Each invocation re-evaluates the full pipeline over the shared, immutable
/// record set; there is no cached intermediate state between runs.
pub struct LedgerQuery<'a> {
    records: &'a [LedgerRecord],
    filters: Vec<Box<dyn Fn(&LedgerRecord) -> bool + Send + Sync + 'a>>,
}

impl<'a> LedgerQuery<'a> {
    /// Create a new query over a record slice
    pub fn new(records: &'a [LedgerRecord]) -> Self {
        Self {
            records,
            filters: Vec::new(),
        }
    }

    /// Restrict to an inclusive service-date window
    pub fn window(mut self, window: DateWindow) -> Self {
        self.filters
            .push(Box::new(move |r| window.contains(r.service_date)));
        self
    }

    /// Restrict to a payer choice
    pub fn payer(mut self, choice: PayerChoice) -> Self {
        self.filters.push(Box::new(move |r| choice.matches(&r.payer)));
        self
    }

    /// Execute the query and return matching records
    pub fn execute(self) -> Vec<&'a LedgerRecord> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.records
                .par_iter()
                .filter(|record| self.filters.iter().all(|filter| filter(record)))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.records
                .iter()
                .filter(|record| self.filters.iter().all(|filter| filter(record)))
                .collect()
        }
    }

    /// Execute the query and return count only
    pub fn count(self) -> usize {
        self.execute().len()
    }

    /// Execute the query and aggregate the qualifying records
    pub fn summarize(self) -> SummaryTable {
        aggregate(self.execute().into_iter())
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

    fn office_visit_ledger() -> Vec<LedgerRecord> {
        vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 10), 120.0),
        ]
    }

    #[test]
    fn test_single_group_aggregation() {
        let records = office_visit_ledger();
        let table = aggregate(records.iter());

        assert_eq!(table.groups.len(), 1);
        let group = &table.groups[0];
        assert_eq!(group.avg_paid, 110.0);
        assert_eq!(group.total_paid, 220.0);
        assert_eq!(group.claim_count, 2);

        assert_eq!(table.grand_total.avg_paid, Some(110.0));
        assert_eq!(table.grand_total.total_paid, 220.0);
        assert_eq!(table.grand_total.claim_count, 2);
    }

    #[test]
    fn test_grand_total_is_mean_of_group_averages() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 6), 100.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 7), 100.0),
            record("PayerA", "99215", "Complex Visit", (2024, 1, 8), 200.0),
        ];
        let table = aggregate(records.iter());

        // Mean of per-group averages (100.0, 200.0), not the reweighted mean
        // of all four records (125.0).
        assert_eq!(table.grand_total.avg_paid, Some(150.0));
        assert_eq!(table.grand_total.total_paid, 500.0);
        assert_eq!(table.grand_total.claim_count, 4);
    }

    #[test]
    fn test_grand_total_law_over_rounded_values() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 6), 120.5),
            record("PayerB", "99285", "ER Visit", (2024, 1, 7), 33.33),
            record("PayerB", "99285", "ER Visit", (2024, 1, 8), 33.33),
            record("PayerB", "99285", "ER Visit", (2024, 1, 9), 33.33),
        ];
        let table = aggregate(records.iter());

        let total_sum: f64 = table.groups.iter().map(|g| g.total_paid).sum();
        let avg_sum: f64 = table.groups.iter().map(|g| g.avg_paid).sum();
        assert_eq!(table.grand_total.total_paid, round1(total_sum));
        assert_eq!(
            table.grand_total.avg_paid,
            Some(round1(avg_sum / table.groups.len() as f64))
        );
        assert_eq!(
            table.grand_total.claim_count,
            table.groups.iter().map(|g| g.claim_count).sum::<usize>()
        );
    }

    #[test]
    fn test_rounding_half_up_at_one_decimal() {
        // 110.25 is exactly representable; the half must round up.
        let records = vec![
            record("PayerA", "00402", "Anesthesia", (2024, 2, 1), 110.25),
        ];
        let table = aggregate(records.iter());
        assert_eq!(table.groups[0].avg_paid, 110.3);
        assert_eq!(table.groups[0].total_paid, 110.3);
    }

    #[test]
    fn test_description_drift_produces_distinct_groups() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerA", "99213", "Office/Outpatient Visit", (2024, 1, 6), 200.0),
        ];
        let table = aggregate(records.iter());
        assert_eq!(table.groups.len(), 2);
        assert_eq!(table.grand_total.claim_count, 2);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let records = vec![
            record("PayerA", "99285", "ER Visit", (2024, 1, 5), 50.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 6), 100.0),
            record("PayerA", "99285", "ER Visit", (2024, 1, 7), 70.0),
        ];
        let table = aggregate(records.iter());
        assert_eq!(table.groups[0].key.code.as_str(), "99285");
        assert_eq!(table.groups[1].key.code.as_str(), "99213");
    }

    #[test]
    fn test_empty_input_yields_neutral_rollup() {
        let table = aggregate(std::iter::empty());
        assert!(table.groups.is_empty());
        assert_eq!(table.grand_total.avg_paid, None);
        assert_eq!(table.grand_total.total_paid, 0.0);
        assert_eq!(table.grand_total.claim_count, 0);
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.10),
            record("PayerA", "99213", "Office Visit", (2024, 1, 6), 33.33),
            record("PayerB", "99285", "ER Visit", (2024, 1, 7), 912.77),
        ];
        let first = aggregate(records.iter());
        let second = aggregate(records.iter());
        assert_eq!(first, second);
    }

    #[test]
    fn test_window_filter_inclusive_bounds() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerA", "99213", "Office Visit", (2024, 1, 10), 120.0),
            record("PayerA", "99213", "Office Visit", (2024, 2, 1), 90.0),
        ];
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        );
        let filtered = LedgerAnalytics::new(&records).between(window);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_payer_absent_from_window_yields_empty() {
        let records = office_visit_ledger();
        let query = LedgerQuery::new(&records)
            .payer(PayerChoice::One("PayerZ".to_string()));
        let table = query.summarize();
        assert!(table.is_empty());
        assert_eq!(table.grand_total.claim_count, 0);
    }

    #[test]
    fn test_zero_filter_idempotence() {
        let records = vec![
            record("PayerA", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("PayerB", "99285", "ER Visit", (2024, 1, 10), 412.4),
            record("PayerA", "99215", "Complex Visit", (2024, 3, 2), 231.25),
        ];
        let analytics = LedgerAnalytics::new(&records);
        let span = analytics.date_span().unwrap();

        let unfiltered = analytics.aggregate();
        let full_span = LedgerQuery::new(&records)
            .window(span)
            .payer(PayerChoice::All)
            .summarize();
        assert_eq!(unfiltered, full_span);
    }

    #[test]
    fn test_distinct_payers_sorted() {
        let records = vec![
            record("Medicare", "99213", "Office Visit", (2024, 1, 5), 100.0),
            record("Aetna", "99213", "Office Visit", (2024, 1, 6), 95.0),
            record("Medicare", "99285", "ER Visit", (2024, 1, 7), 400.0),
        ];
        let payers = LedgerAnalytics::new(&records).distinct_payers();
        assert_eq!(payers, vec!["Aetna", "Medicare"]);
    }
}
