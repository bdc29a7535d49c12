//! Deterministic baseline extraction.

use tracing::debug;

use super::rules::patterns::{INVOICE_DATE_PATTERNS, INVOICE_NUMBER_PATTERNS, TOTAL_AMOUNT_PATTERNS};
use super::rules::{FieldExtractor, PatternRule};
use crate::models::record::BaselineRecord;

/// Extracts the baseline fields with ordered pattern rules. Never fails.
pub struct BaselineExtractor {
    invoice_number: PatternRule,
    invoice_date: PatternRule,
    total_amount: PatternRule,
}

impl BaselineExtractor {
    pub fn new() -> Self {
        Self {
            invoice_number: PatternRule::new("invoice_number", &INVOICE_NUMBER_PATTERNS),
            invoice_date: PatternRule::new("invoice_date", &INVOICE_DATE_PATTERNS),
            total_amount: PatternRule::new("total_amount", &TOTAL_AMOUNT_PATTERNS),
        }
    }

    pub fn extract(&self, text: &str) -> BaselineRecord {
        let record = BaselineRecord {
            invoice_number: self.field(&self.invoice_number, text),
            invoice_date: self.field(&self.invoice_date, text),
            total_amount: self.field(&self.total_amount, text),
        };

        debug!("Baseline extraction found {}/3 fields", record.found_count());
        record
    }

    fn field(&self, rule: &PatternRule, text: &str) -> Option<String> {
        let found = rule.extract(text)?;
        debug!(
            "{} = {:?} (confidence {:.2})",
            rule.name(),
            found.value,
            found.confidence
        );
        Some(found.value)
    }
}

impl Default for BaselineExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the baseline rules over `text`.
pub fn extract_baseline(text: &str) -> BaselineRecord {
    BaselineExtractor::new().extract(text)
}
