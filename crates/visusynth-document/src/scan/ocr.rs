// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process OCR using the `ocrs` crate, a pure-Rust engine backed by neural
// network models executed via `rten`.
//
// # Feature Gate
//
// Only compiled with the `ocr` feature:
//
// ```toml
// visusynth-document = { path = "crates/visusynth-document", features = ["ocr"] }
// ```
//
// # Models
//
// Two model files are required, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`), which is the default
// lookup directory here.
//
// The published models read Latin script only.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};
use visusynth_core::error::{Result, VisusynthError};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrModels {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrModels {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModels {
    /// Expect both well-known model files inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Check that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(VisusynthError::Recognition(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download the models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loaded `ocrs` engine. Model loading is the expensive part, so one
/// recognizer should serve a whole batch.
pub struct OcrRecognizer {
    engine: OcrsEngine,
}

impl OcrRecognizer {
    /// Load both models and initialise the engine.
    ///
    /// `ocrs` and `rten` are 10-100x slower in debug builds.
    #[instrument(skip_all, fields(
        detection = %models.detection_model_path.display(),
        recognition = %models.recognition_model_path.display(),
    ))]
    pub fn load(models: &OcrModels) -> Result<Self> {
        models.validate()?;

        info!("Loading OCR models");
        let detection_model = Model::load_file(&models.detection_model_path).map_err(|err| {
            VisusynthError::Recognition(format!(
                "failed to load detection model from {}: {}",
                models.detection_model_path.display(),
                err
            ))
        })?;
        let recognition_model =
            Model::load_file(&models.recognition_model_path).map_err(|err| {
                VisusynthError::Recognition(format!(
                    "failed to load recognition model from {}: {}",
                    models.recognition_model_path.display(),
                    err
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            VisusynthError::Recognition(format!("failed to initialise OCR engine: {err}"))
        })?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Decode encoded image bytes and recognize them.
    pub fn recognize_bytes(&self, data: &[u8], file_name: &str) -> Result<String> {
        let image = image::load_from_memory(data).map_err(|err| VisusynthError::Decode {
            file: file_name.to_string(),
            detail: err.to_string(),
        })?;
        self.recognize_text(&image)
    }

    /// Extract all text, one recognized line per output line.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            VisusynthError::Recognition(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;

        let input = self.engine.prepare_input(source).map_err(|err| {
            VisusynthError::Recognition(format!("OCR preprocessing failed: {err}"))
        })?;

        let text = self.engine.get_text(&input).map_err(|err| {
            VisusynthError::Recognition(format!("OCR text recognition failed: {err}"))
        })?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}
