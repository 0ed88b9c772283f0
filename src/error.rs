/*!
 * Error handling for ledger aggregation and projection operations
 *
 * Provides detailed error types with context, suggestions, and recovery guidance.
 */

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// Revest library result type
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types with context and suggestions
#[derive(Error, Debug)]
pub enum LedgerError {
    /// File I/O errors with context
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },

    /// CSV parsing errors with location information
    #[error("CSV parsing error at line {line:?}: {message}")]
    CsvParse {
        message: String,
        line: Option<usize>,
        column: Option<String>,
        context: ErrorContext,
    },

    /// Required semantic columns could not be resolved from the header row
    #[error("Schema error: {message}")]
    Schema {
        message: String,
        missing_fields: Vec<String>,
        found_headers: Vec<String>,
        suggestion: String,
    },

    /// Date parsing errors with format hints
    #[error("Date parsing error: {message}")]
    DateParse {
        message: String,
        value: String,
        expected_formats: Vec<String>,
    },

    /// Data validation errors with detailed information
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        field: Option<String>,
        value: Option<String>,
        context: ErrorContext,
    },

    /// File not found with suggestions
    #[error("File not found: {path}")]
    FileNotFound {
        path: PathBuf,
        suggestion: String,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        suggestion: Option<String>,
    },

    /// Export errors
    #[error("Export error: {message}")]
    Export {
        message: String,
        format: ExportFormat,
        suggestion: Option<String>,
    },

    /// Generic errors with custom message
    #[error("{message}")]
    Custom {
        message: String,
        suggestion: Option<String>,
    },
}

/// Error context providing additional information
#[derive(Debug, Default, Clone)]
pub struct ErrorContext {
    pub file_path: Option<PathBuf>,
    pub line_number: Option<usize>,
    pub column_name: Option<String>,
}

/// Export format for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    JsonLines,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "JSON"),
            ExportFormat::JsonLines => write!(f, "JSON Lines"),
            ExportFormat::Csv => write!(f, "CSV"),
        }
    }
}

impl LedgerError {
    /// Create a file not found error with helpful suggestion
    pub fn file_not_found_with_suggestion(path: PathBuf) -> Self {
        let suggestion = format!(
            "Check if the file exists at '{}'. Make sure the path is correct and you have read permissions.",
            path.display()
        );
        Self::FileNotFound { path, suggestion }
    }

    /// Create a schema error naming the semantic fields that could not be resolved
    pub fn schema_missing_fields(missing: Vec<String>, found_headers: Vec<String>) -> Self {
        let message = format!(
            "Could not resolve required column(s): {}",
            missing.join(", ")
        );
        let suggestion = format!(
            "Headers are matched case- and space-insensitively. Expected columns covering \
            payer, procedure code, procedure description, paid amount, and service date; \
            found: {}",
            if found_headers.is_empty() {
                "(no headers)".to_string()
            } else {
                found_headers.join(", ")
            }
        );

        Self::Schema {
            message,
            missing_fields: missing,
            found_headers,
            suggestion,
        }
    }

    /// Create a date parsing error with format information
    pub fn date_parse_with_formats(value: &str, expected_formats: &[&str]) -> Self {
        Self::DateParse {
            message: format!("Cannot parse '{}' as date", value),
            value: value.to_string(),
            expected_formats: expected_formats.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::FileNotFound { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::Schema { suggestion, .. } => {
                format!("{}\n\nSuggestion: {}", self, suggestion)
            }
            Self::DateParse { expected_formats, .. } => {
                format!("{}\n\nExpected formats: {}", self, expected_formats.join(", "))
            }
            Self::Configuration { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            Self::Custom { suggestion: Some(sug), .. } => {
                format!("{}\n\nSuggestion: {}", self, sug)
            }
            _ => self.to_string(),
        }
    }
}

// Convenience conversions
impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
            context: ErrorContext::default(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        let (line, message) = match err.position() {
            Some(pos) => (Some(pos.line() as usize), err.to_string()),
            None => (None, err.to_string()),
        };

        Self::CsvParse {
            message,
            line,
            column: None,
            context: ErrorContext::default(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Export {
            message: err.to_string(),
            format: ExportFormat::Json,
            suggestion: Some("Check if the data is serializable to JSON.".to_string()),
        }
    }
}
