//! Text recognition for pages without a text layer.

#[cfg(feature = "onnx-ocr")]
mod pure_engine;

#[cfg(feature = "onnx-ocr")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use tracing::{info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Converts a rendered page image into text.
pub trait PageRecognizer: Send + Sync {
    /// Recognize the text on one page image, lines in reading order.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

// The pipeline shares its recognizer across threads.
#[cfg(feature = "onnx-ocr")]
const _: fn() = || {
    fn assert_recognizer<T: PageRecognizer>() {}
    assert_recognizer::<PureOcrEngine>();
};

/// Model files expected in `OcrConfig::model_dir`.
pub const DETECTION_MODEL: &str = "det.onnx";
pub const RECOGNITION_MODEL: &str = "latin_rec.onnx";
pub const DICTIONARY: &str = "latin_dict.txt";

/// Build the configured recognizer.
///
/// Returns `None` when OCR is disabled or the engine cannot be loaded; scanned pages
/// are then left empty with a warning.
pub fn load_recognizer(config: &OcrConfig) -> Option<Box<dyn PageRecognizer>> {
    if !config.enabled {
        info!("OCR disabled; scanned pages will be left empty");
        return None;
    }

    match create_engine(config) {
        Ok(engine) => Some(engine),
        Err(e) => {
            warn!("OCR unavailable: {}", e);
            None
        }
    }
}

#[cfg(feature = "onnx-ocr")]
fn create_engine(config: &OcrConfig) -> Result<Box<dyn PageRecognizer>, OcrError> {
    let missing: Vec<&str> = [DETECTION_MODEL, RECOGNITION_MODEL, DICTIONARY]
        .into_iter()
        .filter(|f| !config.model_dir.join(f).exists())
        .collect();

    if !missing.is_empty() {
        return Err(OcrError::ModelLoad(format!(
            "missing {} in {}",
            missing.join(", "),
            config.model_dir.display()
        )));
    }

    Ok(Box::new(PureOcrEngine::from_dir(config)?))
}

#[cfg(not(feature = "onnx-ocr"))]
fn create_engine(_config: &OcrConfig) -> Result<Box<dyn PageRecognizer>, OcrError> {
    Err(OcrError::ModelLoad(
        "built without the onnx-ocr feature".to_string(),
    ))
}
