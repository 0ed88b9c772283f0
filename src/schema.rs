/*!
 * Schema resolution for billing ledger CSV files
 *
 * Ledger exports vary by revision: column names differ in casing, spacing,
 * and wording between files. This module canonicalizes header names and
 * resolves them against the five semantic fields the pipeline requires.
 */

use crate::LedgerError;

/// The five semantic fields every usable ledger file must provide
pub const REQUIRED_FIELDS: [&str; 5] = [
    "payer",
    "procedure_code",
    "procedure_description",
    "paid_amount",
    "service_date",
];

/// Canonicalize a raw header name: trim, lowercase, internal spaces to underscores
pub fn canonicalize_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolved column positions for the five semantic fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub payer: usize,
    pub procedure_code: usize,
    pub procedure_description: usize,
    pub paid_amount: usize,
    pub service_date: usize,
}

/// Billing ledger file schema
pub struct LedgerSchema;

impl LedgerSchema {
    /// Accepted canonicalized names for the payer column
    pub fn payer_aliases() -> &'static [&'static str] {
        &["payer", "insurance", "insurance_company", "payor", "carrier"]
    }

    /// Accepted canonicalized names for the procedure code column
    pub fn procedure_code_aliases() -> &'static [&'static str] {
        &["procedure_code", "charge_code", "cpt", "cpt_code", "code", "hcpcs_code"]
    }

    /// Accepted canonicalized names for the procedure description column
    pub fn procedure_description_aliases() -> &'static [&'static str] {
        &[
            "procedure_description",
            "charge_description",
            "description",
            "procedure",
            "service_description",
        ]
    }

    /// Accepted canonicalized names for the paid amount column
    pub fn paid_amount_aliases() -> &'static [&'static str] {
        &["paid_amount", "paid", "amount_paid", "payment", "payment_amount"]
    }

    /// Accepted canonicalized names for the service date column
    pub fn service_date_aliases() -> &'static [&'static str] {
        &["service_date", "date_of_service", "dos", "date"]
    }

    /// Resolve a raw header row into column positions
    ///
    /// Headers are canonicalized before matching, so ` Charge Description `
    /// and `charge_description` resolve identically. The first header matching
    /// a field's alias set wins. Any unresolved field fails the whole file
    /// with a schema error naming every missing field.
    pub fn resolve_headers(headers: &[String]) -> Result<ColumnLayout, LedgerError> {
        let canonical: Vec<String> = headers.iter().map(|h| canonicalize_header(h)).collect();

        let find = |aliases: &[&str]| -> Option<usize> {
            canonical.iter().position(|h| aliases.contains(&h.as_str()))
        };

        let payer = find(Self::payer_aliases());
        let procedure_code = find(Self::procedure_code_aliases());
        let procedure_description = find(Self::procedure_description_aliases());
        let paid_amount = find(Self::paid_amount_aliases());
        let service_date = find(Self::service_date_aliases());

        let mut missing = Vec::new();
        if payer.is_none() {
            missing.push("payer".to_string());
        }
        if procedure_code.is_none() {
            missing.push("procedure_code".to_string());
        }
        if procedure_description.is_none() {
            missing.push("procedure_description".to_string());
        }
        if paid_amount.is_none() {
            missing.push("paid_amount".to_string());
        }
        if service_date.is_none() {
            missing.push("service_date".to_string());
        }

        if !missing.is_empty() {
            return Err(LedgerError::schema_missing_fields(
                missing,
                headers.to_vec(),
            ));
        }

        Ok(ColumnLayout {
            payer: payer.unwrap(),
            procedure_code: procedure_code.unwrap(),
            procedure_description: procedure_description.unwrap(),
            paid_amount: paid_amount.unwrap(),
            service_date: service_date.unwrap(),
        })
    }
}
