// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process recognition through `ocrs` (feature `ocr`).
//
// Models are loaded once per session on a blocking thread; each image is
// recognized on a blocking thread too. The published models read Latin
// script only.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};
use visusynth_core::LanguageSpec;
use visusynth_core::error::{Result, VisusynthError};
use visusynth_document::scan::ocr::{OcrModels, OcrRecognizer, default_model_dir};

use crate::engine::{ProgressFn, RecognitionEngine, RecognitionSession};

/// Recognition with the pure-Rust `ocrs` engine.
#[derive(Debug, Clone)]
pub struct OcrsEngine {
    models: OcrModels,
}

impl Default for OcrsEngine {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsEngine {
    /// Use the two model files found in `dir`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            models: OcrModels::from_dir(dir.into()),
        }
    }
}

#[async_trait]
impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    #[instrument(skip(self))]
    async fn open_session(&self, language: LanguageSpec) -> Result<Box<dyn RecognitionSession>> {
        if !language.is_latin_only() {
            return Err(VisusynthError::Recognition(format!(
                "the ocrs models cannot read {}; use the tesseract engine",
                language.display_name()
            )));
        }
        let models = self.models.clone();
        let recognizer = tokio::task::spawn_blocking(move || OcrRecognizer::load(&models))
            .await
            .map_err(|err| VisusynthError::Recognition(format!("model loading task failed: {err}")))??;
        info!("ocrs session ready");
        Ok(Box::new(OcrsSession {
            recognizer: Arc::new(recognizer),
        }))
    }
}

struct OcrsSession {
    recognizer: Arc<OcrRecognizer>,
}

#[async_trait]
impl RecognitionSession for OcrsSession {
    async fn recognize(&mut self, image: &[u8], progress: ProgressFn<'_>) -> Result<String> {
        progress(0.0);
        let recognizer = Arc::clone(&self.recognizer);
        let data = image.to_vec();
        let text = tokio::task::spawn_blocking(move || recognizer.recognize_bytes(&data, "page"))
            .await
            .map_err(|err| VisusynthError::Recognition(format!("recognition task failed: {err}")))??;
        progress(1.0);
        Ok(text)
    }

    async fn terminate(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hindi_is_refused() {
        let engine = OcrsEngine::from_dir("/nonexistent/models");
        for language in [LanguageSpec::Hindi, LanguageSpec::EnglishHindi] {
            let err = engine.open_session(language).await.err().unwrap();
            assert!(matches!(err, VisusynthError::Recognition(ref msg) if msg.contains("cannot read")));
        }
    }

    #[tokio::test]
    async fn missing_models_fail_at_open() {
        let engine = OcrsEngine::from_dir("/nonexistent/models");
        let err = engine.open_session(LanguageSpec::English).await.err().unwrap();
        assert!(matches!(err, VisusynthError::Recognition(_)));
    }
}
