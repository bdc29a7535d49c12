//! The extraction pipeline: text acquisition, baseline rules, the optional model
//! path, and reconciliation of the two into one result.

use std::path::Path;

use invex_llm::{create_backend, LlmBackend, ModelResponse};
use tracing::{info, warn};

use crate::error::Result;
use crate::invoice::BaselineExtractor;
use crate::models::config::InvexConfig;
use crate::models::record::{
    BaselineRecord, ExtractionResult, ModelFailure, PipelineWarning, StructuredRecord, WarningKind,
};
use crate::ocr::{load_recognizer, PageRecognizer};
use crate::pdf::{acquire_text, Document, PageText};
use crate::structured::{recover_json, request_structured, JsonRecovery};
use crate::upload::ScratchUpload;

/// Runs documents through every extraction stage.
///
/// Holds no per-document state, so one instance can serve concurrent requests.
pub struct Pipeline {
    config: InvexConfig,
    backend: Option<Box<dyn LlmBackend>>,
    recognizer: Option<Box<dyn PageRecognizer>>,
    baseline: BaselineExtractor,
}

impl Pipeline {
    /// Pipeline with the configured backend and no recognizer.
    pub fn new(config: InvexConfig) -> Self {
        let backend = create_backend(&config.llm);
        Self {
            config,
            backend,
            recognizer: None,
            baseline: BaselineExtractor::new(),
        }
    }

    /// Pipeline with the configured backend and OCR engine.
    pub fn from_config(config: InvexConfig) -> Self {
        let recognizer = load_recognizer(&config.ocr);
        let mut pipeline = Self::new(config);
        pipeline.recognizer = recognizer;
        pipeline
    }

    pub fn with_backend(mut self, backend: Box<dyn LlmBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn PageRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn config(&self) -> &InvexConfig {
        &self.config
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Extract fields from one document.
    ///
    /// Fails only when the document cannot be read; model failures degrade the result.
    pub fn run(&self, document: &Document) -> Result<ExtractionResult> {
        info!("Processing {} ({} bytes)", document.name(), document.bytes().len());

        let pages = acquire_text(document, &self.config.ocr, self.recognizer.as_deref())?;
        let text = pages.full_text();
        let baseline = self.baseline.extract(&text);

        let model = self
            .backend
            .as_deref()
            .map(|backend| request_structured(backend, &text, &self.config));

        let result = reconcile(
            document.name(),
            pages,
            baseline,
            model,
            self.config.extraction.json_recovery,
        );

        info!(
            "Finished {}: {} baseline fields, structured={}, model_error={}",
            result.source,
            result.parsed_basic.found_count(),
            result.llm_parsed.is_some(),
            result.llm_error.is_some()
        );
        Ok(result)
    }

    /// Store an upload in the scratch directory, run it, and remove it again.
    pub fn run_upload(&self, name: &str, bytes: &[u8]) -> Result<ExtractionResult> {
        self.run_upload_in(&self.config.server.upload_dir, name, bytes)
    }

    /// As [`Pipeline::run_upload`], with an explicit scratch directory.
    pub fn run_upload_in(&self, dir: &Path, name: &str, bytes: &[u8]) -> Result<ExtractionResult> {
        let upload = ScratchUpload::create(dir, name, bytes)?;
        let document = upload.read_document()?;
        self.run(&document)
    }
}

/// Combine the acquired text, the baseline record and the model outcome.
///
/// No field-level merging happens: the baseline is always reported, and the
/// structured record sits beside it when the model output held a usable object.
pub fn reconcile(
    source: &str,
    pages: PageText,
    baseline: BaselineRecord,
    model: Option<ModelResponse>,
    recovery: JsonRecovery,
) -> ExtractionResult {
    let page_count = pages.page_count();
    let raw_text = pages.full_text();
    let mut warnings = pages.warnings;

    let (llm_output_text, llm_parsed, llm_error) = match model {
        None => (None, None, None),
        Some(ModelResponse::Error { error, detail }) => {
            warn!("Model path failed for {}: {} ({})", source, error, detail);
            (None, None, Some(ModelFailure { error, detail }))
        }
        Some(ModelResponse::Text { text }) => {
            let parsed = match recover_json(&text, recovery) {
                None => {
                    warnings.push(PipelineWarning::new(
                        WarningKind::RecoveryFailure,
                        "model output contained no JSON value",
                    ));
                    None
                }
                Some(value) => match StructuredRecord::from_value(value) {
                    Ok(record) => Some(record),
                    Err(reason) => {
                        warnings.push(PipelineWarning::new(
                            WarningKind::RecoveryFailure,
                            format!("model output does not fit the invoice record: {}", reason),
                        ));
                        None
                    }
                },
            };
            if parsed.is_none() {
                warn!("Could not recover a structured record for {}", source);
            }
            (Some(text), parsed, None)
        }
    };

    ExtractionResult {
        message: format!("Invoice extracted from {}", source),
        source: source.to_string(),
        raw_text,
        page_count,
        scanned: pages.scanned,
        parsed_basic: baseline,
        llm_output_text,
        llm_parsed,
        llm_error,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocumentReadError, InvexError, OcrError};
    use crate::pdf::testing::{mixed_invoice, text_page, PdfBuilder};
    use image::DynamicImage;
    use invex_llm::{BackendKind, ErrorKind, LlmError, LlmSettings, ModelRequest, OllamaBackend};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::net::TcpListener;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Backend that answers with a fixed outcome and remembers the prompt.
    struct FakeBackend {
        reply: std::result::Result<String, String>,
        prompt: Mutex<Option<String>>,
    }

    impl FakeBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompt: Mutex::new(None),
            }
        }

        fn failing(detail: &str) -> Self {
            Self {
                reply: Err(detail.to_string()),
                prompt: Mutex::new(None),
            }
        }
    }

    impl LlmBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Ollama
        }

        fn generate(&self, request: &ModelRequest) -> invex_llm::Result<String> {
            *self.prompt.lock().unwrap() = Some(request.prompt.clone());
            self.reply.clone().map_err(LlmError::Transport)
        }
    }

    struct FakeRecognizer(&'static str);

    impl PageRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> std::result::Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    fn invoice_pdf() -> Document {
        let bytes = PdfBuilder::new()
            .page(text_page(&[
                "Invoice Number: INV-1001",
                "Invoice Date: 2024-02-01",
                "Deposit $45.00",
                "Total Due: $120.00",
            ]))
            .build();
        Document::new("invoice.pdf", bytes)
    }

    fn offline_config() -> InvexConfig {
        InvexConfig::default()
    }

    #[test]
    fn test_baseline_only_without_backend() {
        let result = Pipeline::new(offline_config()).run(&invoice_pdf()).unwrap();

        assert_eq!(result.message, "Invoice extracted from invoice.pdf");
        assert_eq!(result.page_count, 1);
        assert!(!result.scanned);
        assert_eq!(result.parsed_basic.invoice_number.as_deref(), Some("INV-1001"));
        assert_eq!(result.parsed_basic.total_amount.as_deref(), Some("$120.00"));
        assert!(!result.model_attempted());
        assert!(result.llm_parsed.is_none());
    }

    #[test]
    fn test_structured_record_beside_baseline() {
        let backend = FakeBackend::replying(
            "Sure! {\"invoice_number\": \"INV-1001\", \"total_amount\": 120.0, \"vendor\": \"ACME\", \"po\": \"77\"}",
        );
        let pipeline = Pipeline::new(offline_config()).with_backend(Box::new(backend));
        let result = pipeline.run(&invoice_pdf()).unwrap();

        let parsed = result.llm_parsed.clone().unwrap();
        assert_eq!(parsed.vendor.as_deref(), Some("ACME"));
        assert_eq!(parsed.extra.get("po"), Some(&json!("77")));
        assert_eq!(result.parsed_basic.invoice_number.as_deref(), Some("INV-1001"));
        assert!(result.llm_output_text.unwrap().starts_with("Sure!"));
        assert!(result.llm_error.is_none());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_prompt_carries_document_text() {
        let backend = FakeBackend::replying("{}");
        let pipeline = Pipeline::new(offline_config());
        let response = request_structured(&backend, "Invoice Number: INV-1001", pipeline.config());

        assert_eq!(response, ModelResponse::text("{}"));
        let prompt = backend.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Invoice Number: INV-1001"));
        assert!(prompt.contains("line_items"));
    }

    #[test]
    fn test_unrecoverable_output_is_a_warning() {
        let pipeline = Pipeline::new(offline_config())
            .with_backend(Box::new(FakeBackend::replying("not json at all")));
        let result = pipeline.run(&invoice_pdf()).unwrap();

        assert_eq!(result.llm_output_text.as_deref(), Some("not json at all"));
        assert!(result.llm_parsed.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::RecoveryFailure);
        assert_eq!(result.parsed_basic.total_amount.as_deref(), Some("$120.00"));
    }

    #[test]
    fn test_non_object_output_is_a_warning() {
        let pipeline = Pipeline::new(offline_config())
            .with_backend(Box::new(FakeBackend::replying("[1, 2, 3]")));
        let result = pipeline.run(&invoice_pdf()).unwrap();

        assert!(result.llm_parsed.is_none());
        assert_eq!(result.warnings[0].kind, WarningKind::RecoveryFailure);
        assert!(result.warnings[0].detail.contains("array"));
    }

    #[test]
    fn test_backend_failure_degrades() {
        let pipeline = Pipeline::new(offline_config())
            .with_backend(Box::new(FakeBackend::failing("connection reset")));
        let result = pipeline.run(&invoice_pdf()).unwrap();

        let failure = result.llm_error.clone().unwrap();
        assert_eq!(failure.error, ErrorKind::InferenceError);
        assert!(failure.detail.contains("connection reset"));
        assert!(result.llm_output_text.is_none());
        assert_eq!(result.parsed_basic.invoice_number.as_deref(), Some("INV-1001"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["llm_error"]["error"], "InferenceError");
    }

    #[test]
    fn test_missing_credentials_degrade() {
        let mut config = offline_config();
        config.llm = LlmSettings::for_backend(BackendKind::HuggingFace);
        let pipeline = Pipeline::new(config);
        assert!(pipeline.has_backend());

        let result = pipeline.run(&invoice_pdf()).unwrap();
        assert_eq!(result.llm_error.unwrap().error, ErrorKind::ConfigurationError);
        assert_eq!(result.parsed_basic.total_amount.as_deref(), Some("$120.00"));
    }

    #[test]
    fn test_backend_timeout_degrades() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                std::thread::sleep(Duration::from_secs(5));
                drop(stream);
            }
        });

        let mut settings = LlmSettings::for_backend(BackendKind::Ollama);
        settings.base_url = Some(format!("http://{}", addr));
        settings.timeout_secs = 1;

        let pipeline =
            Pipeline::new(offline_config()).with_backend(Box::new(OllamaBackend::new(settings)));

        let start = Instant::now();
        let result = pipeline.run(&invoice_pdf()).unwrap();

        assert!(start.elapsed() < Duration::from_secs(4));
        let failure = result.llm_error.unwrap();
        assert_eq!(failure.error, ErrorKind::InferenceError);
        assert!(failure.detail.contains("timed out"));
        assert_eq!(result.parsed_basic.invoice_number.as_deref(), Some("INV-1001"));
    }

    #[test]
    fn test_scanned_second_page() {
        let pipeline = Pipeline::new(offline_config())
            .with_recognizer(Box::new(FakeRecognizer("Total Due: $99.00")));
        let result = pipeline
            .run(&Document::new("mixed.pdf", mixed_invoice()))
            .unwrap();

        assert_eq!(result.page_count, 2);
        assert!(result.scanned);
        assert!(result.raw_text.contains("INV-2024-001"));
        assert!(result.raw_text.ends_with("Total Due: $99.00"));
        assert_eq!(
            result.parsed_basic,
            BaselineRecord {
                invoice_number: Some("INV-2024-001".to_string()),
                invoice_date: Some("03/15/2024".to_string()),
                total_amount: Some("$99.00".to_string()),
            }
        );
    }

    #[test]
    fn test_zero_byte_upload_leaves_no_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(offline_config());

        let err = pipeline.run_upload_in(dir.path(), "empty.pdf", &[]).unwrap_err();

        assert!(matches!(err, InvexError::Document(DocumentReadError::Empty)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_upload_cleanup_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config();
        config.server.upload_dir = dir.path().join("scratch");
        let pipeline = Pipeline::new(config);

        let bytes = invoice_pdf().bytes().to_vec();
        let result = pipeline.run_upload("../invoice.pdf", &bytes).unwrap();

        assert_eq!(result.source, "invoice.pdf");
        assert_eq!(std::fs::read_dir(dir.path().join("scratch")).unwrap().count(), 0);
    }

    #[test]
    fn test_reconcile_without_model() {
        let pages = PageText {
            pages: vec!["a".to_string(), String::new()],
            scanned: true,
            warnings: Vec::new(),
        };
        let result = reconcile(
            "x.pdf",
            pages,
            BaselineRecord::default(),
            None,
            JsonRecovery::OuterBraces,
        );

        assert_eq!(result.raw_text, "a\n");
        assert_eq!(result.page_count, 2);
        assert!(result.scanned);
        assert!(!result.model_attempted());
    }
}
