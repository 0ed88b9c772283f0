/*!
 * Export functionality for aggregated summaries
 *
 * Writes a [`SummaryTable`] (the group rows plus the grand-total rollup) to
 * JSON, JSON Lines, or CSV for downstream presentation tooling.
 */

use std::path::Path;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::{Result, ExportFormat};
use crate::data_types::{SummaryRow, SummaryTable};

/// Display label for the rollup row in flat output formats
///
/// Inside the crate the rollup is a distinct enum variant; the string label
/// exists only at this presentation boundary.
pub const GRAND_TOTAL_LABEL: &str = "GRAND TOTAL";

/// Trait for implementing summary exporters
pub trait SummaryExporter {
    /// Export the summary table
    fn export(&self, table: &SummaryTable, path: &Path) -> Result<()>;

    /// Get the export format
    fn format(&self) -> ExportFormat;
}

/// JSON exporter for summary tables
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one row per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    /// Create a new JSON exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pretty printing
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set JSON Lines format
    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false; // JSON Lines shouldn't be pretty printed
        self
    }
}

impl SummaryExporter for JsonExporter {
    fn export(&self, table: &SummaryTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let rows = table.rows();

        if self.json_lines {
            for row in &rows {
                let json = serde_json::to_string(row)?;
                writeln!(writer, "{}", json)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(writer, &rows)?;
        } else {
            serde_json::to_writer(writer, &rows)?;
        }

        Ok(())
    }

    fn format(&self) -> ExportFormat {
        if self.json_lines {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }
}

/// CSV exporter for summary tables
pub struct CsvExporter {
    /// Whether to include headers
    pub include_headers: bool,
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvExporter {
    /// Create a new CSV exporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set header inclusion
    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }
}

impl SummaryExporter for CsvExporter {
    fn export(&self, table: &SummaryTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(BufWriter::new(file));

        if self.include_headers {
            writer.write_record([
                "procedure_code",
                "procedure_description",
                "avg_paid",
                "total_paid",
                "claim_count",
            ])?;
        }

        for row in table.rows() {
            match row {
                SummaryRow::Group(group) => {
                    let avg = format!("{:.1}", group.avg_paid);
                    let total = format!("{:.1}", group.total_paid);
                    let count = group.claim_count.to_string();
                    writer.write_record([
                        group.key.code.as_str(),
                        group.key.description.as_str(),
                        avg.as_str(),
                        total.as_str(),
                        count.as_str(),
                    ])?;
                }
                SummaryRow::GrandTotal(rollup) => {
                    let avg = rollup
                        .avg_paid
                        .map(|a| format!("{:.1}", a))
                        .unwrap_or_default();
                    let total = format!("{:.1}", rollup.total_paid);
                    let count = rollup.claim_count.to_string();
                    writer.write_record([
                        GRAND_TOTAL_LABEL,
                        "",
                        avg.as_str(),
                        total.as_str(),
                        count.as_str(),
                    ])?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

/// Export a summary table in the given format
pub fn export_summary(table: &SummaryTable, path: &Path, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Json => JsonExporter::new().export(table, path),
        ExportFormat::JsonLines => JsonExporter::new().as_json_lines().export(table, path),
        ExportFormat::Csv => CsvExporter::new().export(table, path),
    }
}
