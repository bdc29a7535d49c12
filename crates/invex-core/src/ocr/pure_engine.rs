//! Page recognizer backed by `pure-onnx-ocr`.
//!
//! The engine keeps per-thread inference state, so it lives on its own worker thread
//! and pages are handed over through a channel.

use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use super::{PageRecognizer, DETECTION_MODEL, DICTIONARY, RECOGNITION_MODEL};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Rows closer than this many pixels are read as one line.
const ROW_HEIGHT: f64 = 20.0;

type Reply = mpsc::Sender<Result<Vec<Region>, OcrError>>;

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    jobs: mpsc::Sender<(DynamicImage, Reply)>,
    keep_unk: bool,
}

/// One recognized region, reduced to what reading order needs.
#[derive(Debug, Clone, PartialEq)]
struct Region {
    x: f64,
    y: f64,
    text: String,
}

impl PureOcrEngine {
    /// Create an engine from the model files in `config.model_dir`.
    ///
    /// The models are loaded on the worker thread; load failures are reported here.
    pub fn from_dir(config: &OcrConfig) -> Result<Self, OcrError> {
        let model_dir = config.model_dir.clone();
        let (jobs, queue) = mpsc::channel::<(DynamicImage, Reply)>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), OcrError>>(1);

        thread::Builder::new()
            .name("invex-ocr".to_string())
            .spawn(move || {
                let built = pure_onnx_ocr::engine::OcrEngineBuilder::new()
                    .det_model_path(&model_dir.join(DETECTION_MODEL))
                    .rec_model_path(&model_dir.join(RECOGNITION_MODEL))
                    .dictionary_path(&model_dir.join(DICTIONARY))
                    .build();

                let engine = match built {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(OcrError::ModelLoad(format!(
                            "pure-onnx-ocr: {}",
                            e
                        ))));
                        return;
                    }
                };

                // Runs until the owning `PureOcrEngine` is dropped.
                for (image, reply) in queue {
                    let regions = engine
                        .run_from_image(&image)
                        .map(|results| {
                            results
                                .iter()
                                .map(|r| {
                                    let (x, y) = r.bounding_box.exterior().coords().fold(
                                        (f64::INFINITY, f64::INFINITY),
                                        |(x, y), c| (x.min(c.x), y.min(c.y)),
                                    );
                                    Region {
                                        x,
                                        y,
                                        text: r.text.clone(),
                                    }
                                })
                                .collect()
                        })
                        .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)));

                    if reply.send(regions).is_err() {
                        warn!("OCR caller went away before the result was ready");
                    }
                }

                debug!("OCR worker stopped");
            })
            .map_err(|e| OcrError::ModelLoad(format!("failed to start OCR worker: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| OcrError::ModelLoad("OCR worker exited during load".to_string()))??;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            jobs,
            keep_unk: config.keep_unk,
        })
    }
}

impl PageRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        let (reply, result) = mpsc::channel();
        self.jobs
            .send((image.clone(), reply))
            .map_err(|_| OcrError::Recognition("OCR worker stopped".to_string()))?;
        let regions = result
            .recv()
            .map_err(|_| OcrError::Recognition("OCR worker stopped".to_string()))??;

        let count = regions.len();
        let text = reading_order(regions, self.keep_unk);

        debug!(
            "Recognized {} regions ({}x{}) in {}ms",
            count,
            width,
            height,
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

/// Join regions top-to-bottom by row, then left-to-right.
fn reading_order(mut regions: Vec<Region>, keep_unk: bool) -> String {
    regions.sort_by(|a, b| {
        let row_a = (a.y / ROW_HEIGHT) as i64;
        let row_b = (b.y / ROW_HEIGHT) as i64;
        row_a
            .cmp(&row_b)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    regions
        .iter()
        .map(|r| {
            if keep_unk {
                r.text.trim().to_string()
            } else {
                r.text.replace("[UNK]", " ").trim().to_string()
            }
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f64, y: f64, text: &str) -> Region {
        Region {
            x,
            y,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_reading_order_rows_then_columns() {
        let regions = vec![
            region(300.0, 52.0, "$20.00"),
            region(10.0, 5.0, "ACME Supplies"),
            region(10.0, 45.0, "Total Due:"),
            region(10.0, 25.0, "Invoice Number: INV-7"),
        ];

        assert_eq!(
            reading_order(regions, false),
            "ACME Supplies\nInvoice Number: INV-7\nTotal Due:\n$20.00"
        );
    }

    #[test]
    fn test_reading_order_unknown_glyphs() {
        let regions = vec![region(0.0, 0.0, "INV[UNK]42"), region(0.0, 30.0, "[UNK]")];

        assert_eq!(reading_order(regions.clone(), false), "INV 42");
        assert_eq!(reading_order(regions, true), "INV[UNK]42\n[UNK]");
    }

    #[test]
    fn test_missing_models_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = OcrConfig {
            model_dir: dir.path().to_path_buf(),
            ..OcrConfig::default()
        };
        assert!(matches!(
            PureOcrEngine::from_dir(&config),
            Err(OcrError::ModelLoad(_))
        ));
    }
}
