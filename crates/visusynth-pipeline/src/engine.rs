// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine contract.
//
// An engine hands out sessions bound to one language. A run holds exactly one
// session, wrapped in `EngineSession`, and must release it on every exit path.

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use visusynth_core::LanguageSpec;
use visusynth_core::error::{Result, VisusynthError};

/// Receives recognition progress for the current image, in `[0, 1]`.
pub type ProgressFn<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// Source of recognition sessions (Tesseract, ocrs, test fakes).
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Prepare a session that recognizes `language`. Model loading and
    /// availability checks happen here, not per image.
    async fn open_session(&self, language: LanguageSpec) -> Result<Box<dyn RecognitionSession>>;
}

/// One engine instance bound to one language.
#[async_trait]
pub trait RecognitionSession: Send {
    /// Recognize the text in one encoded image.
    async fn recognize(&mut self, image: &[u8], progress: ProgressFn<'_>) -> Result<String>;

    /// Tear the session down. Called exactly once.
    async fn terminate(&mut self) -> Result<()>;
}

/// Exclusive handle on the session used by one run.
///
/// Call [`EngineSession::release`] when the run ends, however it ends. A
/// handle dropped without release is logged.
pub struct EngineSession {
    inner: Option<Box<dyn RecognitionSession>>,
    engine: String,
    language: LanguageSpec,
}

impl EngineSession {
    #[instrument(skip(engine), fields(engine = engine.name()))]
    pub async fn acquire(engine: &dyn RecognitionEngine, language: LanguageSpec) -> Result<Self> {
        let session = engine.open_session(language).await?;
        debug!("recognition session opened");
        Ok(Self {
            inner: Some(session),
            engine: engine.name().to_string(),
            language,
        })
    }

    pub fn language(&self) -> LanguageSpec {
        self.language
    }

    /// Recognize one image and normalize the text.
    pub async fn recognize(&mut self, image: &[u8], progress: ProgressFn<'_>) -> Result<String> {
        let session = self
            .inner
            .as_mut()
            .ok_or_else(|| VisusynthError::Recognition("session already released".into()))?;
        let raw = session.recognize(image, progress).await?;
        Ok(normalize_recognized_text(&raw))
    }

    /// Terminate the underlying session. Teardown failures are logged only;
    /// the run outcome is already decided by the time this is called.
    pub async fn release(mut self) {
        if let Some(mut session) = self.inner.take() {
            match session.terminate().await {
                Ok(()) => debug!(engine = %self.engine, "recognition session released"),
                Err(err) => warn!(engine = %self.engine, error = %err, "session teardown failed"),
            }
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if self.inner.is_some() {
            warn!(engine = %self.engine, "recognition session dropped without release");
        }
    }
}

/// Trim every line, drop blank ones, and join the rest with `\n`.
pub fn normalize_recognized_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
