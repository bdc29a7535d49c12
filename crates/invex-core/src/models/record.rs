//! Extracted invoice records and the per-document result.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use invex_llm::ErrorKind;

/// Fields found by the pattern rules. Every field is always present in the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub total_amount: Option<String>,
}

impl BaselineRecord {
    /// Number of fields that were found.
    pub fn found_count(&self) -> usize {
        [&self.invoice_number, &self.invoice_date, &self.total_amount]
            .iter()
            .filter(|f| f.is_some())
            .count()
    }
}

/// A numeric field as the model returned it: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(Number),
    Text(String),
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{}", n),
            Amount::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One invoice line as returned by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub qty: Option<Amount>,
    #[serde(default)]
    pub unit_price: Option<Amount>,
    #[serde(default)]
    pub total: Option<Amount>,
    /// Keys the model added beyond the known ones.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The richer record produced from recovered model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Amount>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<Amount>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItem>>,
    /// Keys the model added beyond the known ones, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredRecord {
    /// Build a record from a recovered JSON value.
    pub fn from_value(value: Value) -> Result<Self, String> {
        if !value.is_object() {
            return Err(format!("expected a JSON object, got {}", json_type(&value)));
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

/// Accept strings, numbers and booleans where a string is expected.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Why part of a result is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A page was not sent to recognition (cap, budget, or no recognizer).
    OcrSkipped,
    /// Rendering or recognizing a page failed.
    OcrFailed,
    /// Model output held no usable JSON object.
    RecoveryFailure,
}

/// A non-fatal problem recorded while processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineWarning {
    pub kind: WarningKind,
    /// 1-based page number, for page-level warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub detail: String,
}

impl PipelineWarning {
    pub fn new(kind: WarningKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            page: None,
            detail: detail.into(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// A failed model call as reported in the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub error: ErrorKind,
    pub detail: String,
}

/// Outcome of running the pipeline on one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub message: String,
    /// Source document name.
    pub source: String,
    /// Full document text, pages joined with newlines.
    pub raw_text: String,
    pub page_count: usize,
    /// True when any page needed recognition.
    pub scanned: bool,
    pub parsed_basic: BaselineRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_parsed: Option<StructuredRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<ModelFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PipelineWarning>,
}

impl ExtractionResult {
    /// Whether the model path was attempted for this document.
    pub fn model_attempted(&self) -> bool {
        self.llm_output_text.is_some() || self.llm_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_baseline_serializes_nulls() {
        let record = BaselineRecord {
            invoice_number: Some("INV-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"invoice_number": "INV-1", "invoice_date": null, "total_amount": null})
        );
        assert_eq!(record.found_count(), 1);
    }

    #[test]
    fn test_structured_accepts_numbers_and_strings() {
        let record = StructuredRecord::from_value(json!({
            "invoice_number": 10042,
            "total_amount": 1250.5,
            "tax_amount": "$12.00",
            "currency": "USD",
            "line_items": [{"description": "Widget", "qty": 2, "unit_price": "5.00", "total": 10}]
        }))
        .unwrap();

        assert_eq!(record.invoice_number.as_deref(), Some("10042"));
        assert_eq!(record.total_amount.as_ref().map(|a| a.to_string()), Some("1250.5".to_string()));
        assert_eq!(record.tax_amount, Some(Amount::Text("$12.00".to_string())));
        let items = record.line_items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description.as_deref(), Some("Widget"));
        assert_eq!(items[0].qty, Some(Amount::Number(2.into())));
    }

    #[test]
    fn test_structured_preserves_unknown_keys() {
        let record = StructuredRecord::from_value(json!({
            "invoice_number": "A-1",
            "po_number": "PO-77",
            "notes": ["net 30"]
        }))
        .unwrap();

        assert_eq!(record.extra.get("po_number"), Some(&json!("PO-77")));
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["notes"], json!(["net 30"]));
    }

    #[test]
    fn test_structured_rejects_non_objects() {
        assert!(StructuredRecord::from_value(json!([1, 2])).is_err());
        assert!(StructuredRecord::from_value(json!("text")).is_err());
    }

    #[test]
    fn test_structured_rejects_ill_shaped_fields() {
        let err = StructuredRecord::from_value(json!({"line_items": "two widgets"})).unwrap_err();
        assert!(!err.is_empty());
        assert!(StructuredRecord::from_value(json!({"vendor": {"name": "Acme"}})).is_err());
    }

    #[test]
    fn test_result_omits_unattempted_model_fields() {
        let result = ExtractionResult {
            message: "Invoice extracted from a.pdf".to_string(),
            source: "a.pdf".to_string(),
            raw_text: String::new(),
            page_count: 1,
            scanned: false,
            parsed_basic: BaselineRecord::default(),
            llm_output_text: None,
            llm_parsed: None,
            llm_error: None,
            warnings: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("llm_error").is_none());
        assert!(json.get("warnings").is_none());
        assert_eq!(json["parsed_basic"]["total_amount"], Value::Null);
        assert!(!result.model_attempted());
    }
}
