//! Per-page text acquisition with recognition fallback.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{Document, PdfExtractor, Result};
use crate::models::config::OcrConfig;
use crate::models::record::{PipelineWarning, WarningKind};
use crate::ocr::PageRecognizer;

/// Text of every page, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    /// One entry per page; empty when the page had no text and recognition was
    /// skipped or failed.
    pub pages: Vec<String>,
    /// True when any page lacked a text layer.
    pub scanned: bool,
    /// Pages that degraded.
    pub warnings: Vec<PipelineWarning>,
}

impl PageText {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with newlines.
    pub fn full_text(&self) -> String {
        self.pages.join("\n")
    }
}

/// Read the text of every page of `document`.
///
/// Pages without a text layer are rendered and passed to `recognizer`, subject to the
/// page cap and time budget in `config`. Only an unreadable document is an error.
pub fn acquire_text(
    document: &Document,
    config: &OcrConfig,
    recognizer: Option<&dyn PageRecognizer>,
) -> Result<PageText> {
    let pdf = PdfExtractor::load(document.bytes())?;
    let page_count = pdf.page_count();

    let recognizer = recognizer.filter(|_| config.enabled);
    let budget = (config.time_budget_secs > 0).then(|| Duration::from_secs(config.time_budget_secs));
    let started = Instant::now();
    let mut ocr_pages = 0usize;

    let mut result = PageText {
        pages: Vec::with_capacity(page_count as usize),
        ..Default::default()
    };

    for page in 1..=page_count {
        let text = pdf.extract_page_text(page).unwrap_or_else(|e| {
            debug!("No usable text layer on page {}: {}", page, e);
            String::new()
        });

        if !text.trim().is_empty() {
            debug!("Page {}: {} chars from text layer", page, text.len());
            result.pages.push(text);
            continue;
        }

        result.scanned = true;

        let skip_reason = match recognizer {
            None => Some("no recognizer configured".to_string()),
            Some(_) if config.max_ocr_pages > 0 && ocr_pages >= config.max_ocr_pages => {
                Some(format!("OCR page cap of {} reached", config.max_ocr_pages))
            }
            Some(_) if budget.is_some_and(|b| started.elapsed() >= b) => Some(format!(
                "OCR time budget of {}s exhausted",
                config.time_budget_secs
            )),
            Some(_) => None,
        };

        let Some(recognizer) = recognizer.filter(|_| skip_reason.is_none()) else {
            let reason = skip_reason.unwrap_or_default();
            warn!("Page {} not recognized: {}", page, reason);
            result
                .warnings
                .push(PipelineWarning::new(WarningKind::OcrSkipped, reason).with_page(page));
            result.pages.push(String::new());
            continue;
        };

        ocr_pages += 1;
        let recognized = pdf
            .render_page(page, config.max_image_size)
            .map_err(|e| e.to_string())
            .and_then(|image| recognizer.recognize(&image).map_err(|e| e.to_string()));

        match recognized {
            Ok(text) => {
                debug!("Page {}: {} chars from recognition", page, text.len());
                result.pages.push(text);
            }
            Err(reason) => {
                warn!("Recognition failed on page {}: {}", page, reason);
                result
                    .warnings
                    .push(PipelineWarning::new(WarningKind::OcrFailed, reason).with_page(page));
                result.pages.push(String::new());
            }
        }
    }

    info!(
        "Acquired text for {}: {} pages, {} recognized, scanned={}",
        document.name(),
        page_count,
        ocr_pages,
        result.scanned
    );

    Ok(result)
}
