//! Ordered regex patterns for invoice field extraction.
//!
//! Each list runs from the most specific (labeled) pattern to the loosest scan.
//! Capture group 1 holds the value.

use lazy_static::lazy_static;
use regex::Regex;

/// Month names accepted in written-out dates.
const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

/// Currency symbols and codes kept as part of an amount.
const CURRENCY_SYMBOL: &str = r"[$€£₹¥]";
const CURRENCY_CODE: &str = r"(?:USD|EUR|GBP|INR|CAD|AUD|PLN|CHF)";

fn date_token() -> String {
    format!(
        r"(\d{{1,2}}[-/.]\d{{1,2}}[-/.]\d{{2,4}}|\d{{4}}[-/.]\d{{1,2}}[-/.]\d{{1,2}}|\d{{1,2}}\s+{m}\.?,?\s+\d{{4}}|{m}\.?\s+\d{{1,2}},?\s+\d{{4}})",
        m = MONTH
    )
}

fn number() -> &'static str {
    r"(?:\d{1,3}(?:[,.]\d{3})+(?:[.,]\d{1,2})?\b|\d+(?:[.,]\d{1,2})?\b)"
}

fn amount_token() -> String {
    format!(
        r"((?:{sym}\s?|{code}\s?)?-?{num}(?:\s?{code}\b)?)",
        sym = CURRENCY_SYMBOL,
        code = CURRENCY_CODE,
        num = number()
    )
}

lazy_static! {
    // Invoice number
    pub static ref INVOICE_NUMBER_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)\binvoice\s*(?:number\b|num\b\.?|no\b\.?|#)\s*[:#.]?\s*([A-Z0-9][A-Z0-9\-/._]*)"
        ).unwrap(),
        Regex::new(r"(?i)\binv\s*#\s*[:.]?\s*([A-Z0-9][A-Z0-9\-/._]*)").unwrap(),
        Regex::new(r"(?i)\b(INV-[A-Z0-9][A-Z0-9\-/._]*)").unwrap(),
    ];

    // Invoice date
    pub static ref INVOICE_DATE_PATTERNS: Vec<Regex> = vec![
        Regex::new(&format!(
            r"(?i)\b(?:invoice\s+date|issue\s+date|date\s+of\s+issue|date\s+issued)\s*[:\-]?\s*{}",
            date_token()
        )).unwrap(),
        Regex::new(&format!(r"(?im)^\s*date\b\s*[:\-]?\s*{}", date_token())).unwrap(),
        Regex::new(&format!(r"(?i)\b{}", date_token())).unwrap(),
    ];

    // Total amount
    pub static ref TOTAL_AMOUNT_PATTERNS: Vec<Regex> = vec![
        Regex::new(&format!(
            r"(?i)\b(?:total\s+due|amount\s+due|balance\s+due|grand\s+total|total\s+payable|total\s+amount|invoice\s+total|amount\s+payable)\s*[:\-]?\s*{}",
            amount_token()
        )).unwrap(),
        // A short label tail may sit between "total" and the amount, e.g. "Total (incl. VAT):"
        Regex::new(&format!(
            r"(?i)\btotal\b[^\n\d$€£₹¥]{{0,20}}?[:\-]?\s*{}",
            amount_token()
        )).unwrap(),
        Regex::new(&format!(r"({}\s?{})", CURRENCY_SYMBOL, number())).unwrap(),
    ];

    // Line item rows: a number, whitespace, then another number
    pub static ref LINE_ITEM_ROW: Regex = Regex::new(r"\d+\s+\d+(?:\.\d+)?").unwrap();

    pub static ref COLUMN_GAP: Regex = Regex::new(r"\s{2,}").unwrap();

    pub static ref CURRENCY_CHARS: Regex = Regex::new(r"[$€£₹¥,\s]").unwrap();
}
