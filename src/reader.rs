/*!
 * CSV reader for billing ledger files
 *
 * Reads raw ledger exports into normalized [`LedgerRecord`]s: header
 * resolution against the semantic schema, per-row coercion (absolute paid
 * amounts, verbatim text procedure codes), and skip accounting for rows the
 * pipeline must exclude rather than fail on.
 */

use std::path::Path;
use std::fs::File;
use std::io;
use csv::ReaderBuilder;
use chrono::NaiveDate;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Result, LedgerError,
    data_types::{LedgerRecord, ProcedureCode},
    schema::{ColumnLayout, LedgerSchema},
};

/// Date formats accepted for `service_date`, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Accounting of rows excluded during normalization
///
/// Row-level problems are never fatal: the affected row is dropped and
/// counted, and the effective record set shrinks accordingly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Total data rows seen (header excluded)
    pub total_rows: usize,
    /// Rows that survived normalization
    pub loaded: usize,
    /// Rows dropped for an unparsable service date
    pub unparsable_date: usize,
    /// Rows dropped for a zero paid amount (after taking the absolute value)
    pub zero_amount: usize,
    /// Rows dropped for an unparsable or missing paid amount
    pub bad_amount: usize,
    /// Rows dropped for an empty payer or procedure code
    pub missing_field: usize,
}

impl ReadReport {
    /// Total rows dropped for any reason
    pub fn skipped(&self) -> usize {
        self.unparsable_date + self.zero_amount + self.bad_amount + self.missing_field
    }
}

enum RowSkip {
    UnparsableDate,
    ZeroAmount,
    BadAmount,
    MissingField,
}

/// Billing ledger reader with CSV parsing capabilities
pub struct LedgerReader {
    /// Whether to log a capped sample of skipped rows to stderr
    log_skipped: bool,
    /// Whether to show progress bar
    #[cfg(feature = "progress")]
    show_progress_bar: bool,
}

impl Default for LedgerReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerReader {
    /// Create a new ledger reader with default settings
    pub fn new() -> Self {
        Self {
            log_skipped: false,
            #[cfg(feature = "progress")]
            show_progress_bar: true,
        }
    }

    /// Enable or disable stderr logging of skipped rows
    pub fn with_skip_log(mut self, log: bool) -> Self {
        self.log_skipped = log;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable the progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Load a ledger CSV file into normalized records
    pub fn load_ledger<P: AsRef<Path>>(&self, path: P) -> Result<(Vec<LedgerRecord>, ReadReport)> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LedgerError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let file = File::open(path)?;

        #[cfg(feature = "progress")]
        if self.show_progress_bar {
            let file_size = file.metadata()?.len();
            let pb = ProgressBar::new(file_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .unwrap()
                    .progress_chars("#>-")
            );

            let (records, report) = self.read_ledger(pb.wrap_read(file))?;
            pb.finish_and_clear();
            println!(
                "Loaded {} ledger records ({} skipped)",
                report.loaded,
                report.skipped()
            );
            return Ok((records, report));
        }

        self.read_ledger(file)
    }

    /// Read a ledger from any source of CSV bytes
    pub fn read_ledger<R: io::Read>(&self, source: R) -> Result<(Vec<LedgerRecord>, ReadReport)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(source);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let layout = LedgerSchema::resolve_headers(&headers)?;

        let mut records = Vec::new();
        let mut report = ReadReport::default();

        for (idx, result) in reader.records().enumerate() {
            let line_number = idx + 2; // header occupies line 1
            report.total_rows += 1;

            let csv_record = result.map_err(|e| LedgerError::CsvParse {
                message: e.to_string(),
                line: Some(line_number),
                column: None,
                context: Default::default(),
            })?;

            match self.parse_row(&csv_record, &layout) {
                Ok(record) => {
                    records.push(record);
                    report.loaded += 1;
                }
                Err(skip) => {
                    match skip {
                        RowSkip::UnparsableDate => report.unparsable_date += 1,
                        RowSkip::ZeroAmount => report.zero_amount += 1,
                        RowSkip::BadAmount => report.bad_amount += 1,
                        RowSkip::MissingField => report.missing_field += 1,
                    }
                    if self.log_skipped && report.skipped() <= 10 {
                        eprintln!("Warning: skipping ledger row {}", line_number);
                    }
                }
            }
        }

        Ok((records, report))
    }

    /// Normalize one CSV row into a ledger record, or classify why it is dropped
    fn parse_row(
        &self,
        record: &csv::StringRecord,
        layout: &ColumnLayout,
    ) -> std::result::Result<LedgerRecord, RowSkip> {
        let get_field = |index: usize| -> Option<&str> {
            record.get(index)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };

        let payer = get_field(layout.payer).ok_or(RowSkip::MissingField)?.to_string();

        // Procedure codes stay text: no numeric round-trip that would strip
        // leading zeros or mangle alphanumeric codes.
        let code_str = get_field(layout.procedure_code).ok_or(RowSkip::MissingField)?;
        let procedure_code = ProcedureCode::new(code_str.to_string())
            .map_err(|_| RowSkip::MissingField)?;

        let procedure_description = get_field(layout.procedure_description)
            .unwrap_or("")
            .to_string();

        let date_str = get_field(layout.service_date).ok_or(RowSkip::UnparsableDate)?;
        let service_date = parse_service_date(date_str).map_err(|_| RowSkip::UnparsableDate)?;

        let amount_str = get_field(layout.paid_amount).ok_or(RowSkip::BadAmount)?;
        let amount = parse_amount(amount_str).ok_or(RowSkip::BadAmount)?;

        // Sign carries no signal in these exports; magnitude does. Zero-paid
        // rows carry no financial signal at all and would corrupt averages.
        let amount_paid = amount.abs();
        if amount_paid == 0.0 {
            return Err(RowSkip::ZeroAmount);
        }

        Ok(LedgerRecord {
            payer,
            procedure_code,
            procedure_description,
            service_date,
            amount_paid,
        })
    }
}

/// Parse a service date, trying each accepted format in order
pub fn parse_service_date(date_str: &str) -> Result<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(date);
        }
    }
    Err(LedgerError::date_parse_with_formats(date_str, &DATE_FORMATS))
}

/// Parse a paid amount, tolerating currency symbols and thousands separators
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|&c| c != '$' && c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> (Vec<LedgerRecord>, ReadReport) {
        LedgerReader::new()
            .read_ledger(csv.as_bytes())
            .expect("ledger should read")
    }

    #[test]
    fn test_normalization_drops_zero_and_abs_negative() {
        let csv = "\
insurance,charge_code,charge_description,paid,date
PayerA,99213,Office Visit,100.0,2024-01-05
PayerA,99213,Office Visit,-120.0,2024-01-10
PayerA,99214,Extended Visit,0.0,2024-01-15
";
        let (records, report) = read(csv);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.amount_paid > 0.0));
        assert_eq!(records[1].amount_paid, 120.0);
        assert_eq!(report.zero_amount, 1);
        assert_eq!(report.loaded, 2);
    }

    #[test]
    fn test_procedure_code_keeps_leading_zeros() {
        let csv = "\
payer,code,description,paid,service_date
PayerA,00402,Anesthesia,350.0,2024-02-01
PayerA,J0696,Injection,12.5,2024-02-02
";
        let (records, _) = read(csv);
        assert_eq!(records[0].procedure_code.as_str(), "00402");
        assert_eq!(records[1].procedure_code.as_str(), "J0696");
    }

    #[test]
    fn test_unparsable_date_drops_row_not_batch() {
        let csv = "\
payer,code,description,paid,service_date
PayerA,99213,Office Visit,100.0,not-a-date
PayerB,99213,Office Visit,80.0,2024-03-01
";
        let (records, report) = read(csv);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payer, "PayerB");
        assert_eq!(report.unparsable_date, 1);
        assert_eq!(report.total_rows, 2);
    }

    #[test]
    fn test_amount_tolerates_currency_formatting() {
        let csv = "\
payer,code,description,paid,service_date
PayerA,99285,ER Visit,\"$1,250.75\",2024-01-20
";
        let (records, _) = read(csv);
        assert_eq!(records[0].amount_paid, 1250.75);
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let csv = "payer,code,paid\nPayerA,99213,100.0\n";
        let err = LedgerReader::new().read_ledger(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::Schema { .. }));
    }

    #[test]
    fn test_both_date_formats_accepted() {
        assert_eq!(
            parse_service_date("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(
            parse_service_date("01/05/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_service_date("05.01.2024").is_err());
    }
}
