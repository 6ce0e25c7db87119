// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review session: what the user works with after a run has finalized.
//
// Holds the extracted text and an editable copy. Every operation reads the
// edited copy; none of them can change the finished run.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use visusynth_bridge::NativeClipboard;
use visusynth_core::config::LayoutSettings;
use visusynth_core::error::{Result, VisusynthError};
use visusynth_core::{LanguageSpec, ProcessingInfo};
use visusynth_document::{PageLayout, PdfRenderer};
use visusynth_document::export::{self, ExportArtifact};

use crate::correction::CorrectionService;
use crate::orchestrator::RunOutput;
use crate::summarize::{SummarizationService, summarize_text};

/// Editable result of a finished run.
pub struct ReviewSession {
    extracted: String,
    edited: String,
    files_processed: usize,
    language: LanguageSpec,
    layout: LayoutSettings,
    corrector: Option<Arc<dyn CorrectionService>>,
    summarizer: Option<Arc<dyn SummarizationService>>,
    clipboard: Option<Arc<dyn NativeClipboard + Send + Sync>>,
}

impl ReviewSession {
    /// Start reviewing `output`; the edited copy begins as the run's final text.
    pub fn new(output: &RunOutput, layout: LayoutSettings) -> Self {
        Self {
            extracted: output.extracted_text.clone(),
            edited: output.text.clone(),
            files_processed: output.files_processed(),
            language: output.language,
            layout,
            corrector: None,
            summarizer: None,
            clipboard: None,
        }
    }

    pub fn with_corrector(mut self, corrector: Arc<dyn CorrectionService>) -> Self {
        self.corrector = Some(corrector);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn SummarizationService>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn NativeClipboard + Send + Sync>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Text as recognized, before correction or edits.
    pub fn extracted_text(&self) -> &str {
        &self.extracted
    }

    /// The current edited copy.
    pub fn text(&self) -> &str {
        &self.edited
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.edited = text.into();
    }

    /// Run correction over the edited copy and keep the result. On failure
    /// the edited copy is left as it was.
    #[instrument(skip(self), fields(chars = self.edited.chars().count()))]
    pub async fn correct(&mut self) -> Result<&str> {
        let corrector = self
            .corrector
            .as_ref()
            .ok_or_else(|| VisusynthError::Correction("no correction service is configured".into()))?;
        match corrector.correct(&self.edited).await {
            Ok(corrected) => {
                self.edited = corrected;
                info!("edited text corrected");
                Ok(&self.edited)
            }
            Err(err) => {
                warn!(error = %err, "correction failed, edited text unchanged");
                Err(match err {
                    VisusynthError::Correction(_) => err,
                    other => VisusynthError::Correction(other.to_string()),
                })
            }
        }
    }

    /// Summarize the edited copy.
    pub async fn summarize(&self) -> Result<String> {
        let summarizer = self.summarizer.as_deref().ok_or_else(|| {
            VisusynthError::Summarization("no summarization service is configured".into())
        })?;
        summarize_text(summarizer, &self.edited).await
    }

    /// Page layout of the edited copy.
    pub fn layout(&self) -> PageLayout {
        PageLayout::build(&self.edited, &self.layout)
    }

    /// Render the edited copy to a timestamped PDF download.
    pub fn render_pdf(&self) -> Result<ExportArtifact> {
        let bytes = PdfRenderer::default().render(&self.layout())?;
        Ok(export::pdf(bytes, Utc::now().timestamp_millis()))
    }

    pub fn export_text(&self) -> ExportArtifact {
        export::plain_text(&self.edited)
    }

    pub fn export_markdown(&self) -> ExportArtifact {
        export::markdown(&self.edited)
    }

    /// Copy the edited copy to the system clipboard.
    pub fn copy_to_clipboard(&self) -> Result<()> {
        let clipboard = self
            .clipboard
            .as_ref()
            .ok_or_else(|| VisusynthError::Clipboard("no clipboard is available".into()))?;
        clipboard.write_text(&self.edited).map_err(|err| match err {
            VisusynthError::Clipboard(_) => err,
            other => VisusynthError::Clipboard(other.to_string()),
        })
    }

    /// Counts shown beside the editor.
    pub fn info(&self) -> ProcessingInfo {
        ProcessingInfo {
            files_processed: self.files_processed,
            language: self.language,
            characters: self.edited.chars().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use visusynth_core::RunId;

    use super::*;
    use crate::correction::testing::ShoutingCorrector;
    use crate::summarize::testing::FirstSentence;

    #[derive(Default)]
    struct RecordingClipboard {
        copied: Mutex<Vec<String>>,
    }

    impl NativeClipboard for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<()> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct DeniedClipboard;

    impl NativeClipboard for DeniedClipboard {
        fn write_text(&self, _text: &str) -> Result<()> {
            Err(VisusynthError::PlatformUnavailable)
        }
    }

    fn output(text: &str) -> RunOutput {
        RunOutput {
            run_id: RunId::new(),
            language: LanguageSpec::EnglishHindi,
            results: Vec::new(),
            extracted_text: text.to_string(),
            text: text.to_string(),
            warnings: Vec::new(),
        }
    }

    fn session(text: &str) -> ReviewSession {
        ReviewSession::new(&output(text), LayoutSettings::default())
    }

    #[test]
    fn edits_flow_into_every_export() {
        let mut review = session("--- Page 1 ---\n\nHello World");
        review.set_text("TITLE\n\nEdited body");
        assert_eq!(review.extracted_text(), "--- Page 1 ---\n\nHello World");
        assert_eq!(review.export_text().bytes, b"TITLE\n\nEdited body");
        assert_eq!(review.export_markdown().bytes, b"## TITLE\n\nEdited body\n");
        assert_eq!(review.layout().lines().next(), Some("TITLE"));
    }

    #[test]
    fn info_counts_characters_of_the_edit() {
        let mut review = session("abc");
        review.set_text("नमस्ते");
        let info = review.info();
        assert_eq!(info.characters, 6);
        assert_eq!(info.language.display_name(), "English + Hindi");
        assert_eq!(info.files_processed, 0);
    }

    #[test]
    fn pdf_export_has_one_page_per_group() {
        let mut review = session("x");
        review.set_text((1..=60).map(|n| n.to_string()).collect::<Vec<_>>().join("\n"));
        let artifact = review.render_pdf().unwrap();
        assert!(artifact.file_name.starts_with("visusynth-"));
        assert!(artifact.file_name.ends_with(".pdf"));
        let pages = lopdf::Document::load_mem(&artifact.bytes).unwrap().get_pages().len();
        assert_eq!(pages, 2);
    }

    #[test]
    fn hindi_edit_fails_the_pdf_but_exports_as_text() {
        let mut review = session("x");
        review.set_text("नमस्ते दुनिया");
        let err = review.render_pdf().unwrap_err();
        assert!(matches!(err, VisusynthError::Render(_)));
        assert_eq!(review.export_text().bytes, "नमस्ते दुनिया".as_bytes());
        assert_eq!(review.text(), "नमस्ते दुनिया");
    }

    #[test]
    fn empty_edit_cannot_be_rendered() {
        let mut review = session("x");
        review.set_text("");
        assert!(matches!(review.render_pdf(), Err(VisusynthError::Render(_))));
    }

    #[tokio::test]
    async fn correction_updates_the_edit() {
        let mut review = session("hello there").with_corrector(Arc::new(ShoutingCorrector::working()));
        assert_eq!(review.correct().await.unwrap(), "HELLO THERE");
        assert_eq!(review.text(), "HELLO THERE");
        assert_eq!(review.extracted_text(), "hello there");
    }

    #[tokio::test]
    async fn failed_correction_leaves_the_edit_alone() {
        let mut review = session("hello there").with_corrector(Arc::new(ShoutingCorrector::failing()));
        review.set_text("my edit");
        assert!(matches!(review.correct().await, Err(VisusynthError::Correction(_))));
        assert_eq!(review.text(), "my edit");
    }

    #[tokio::test]
    async fn summary_reads_the_edit() {
        let review = session(&"Original sentence here. ".repeat(10)).with_summarizer(Arc::new(FirstSentence));
        assert_eq!(review.summarize().await.unwrap(), "Original sentence here");

        let mut short = session("x").with_summarizer(Arc::new(FirstSentence));
        short.set_text("Too short.");
        assert!(matches!(short.summarize().await, Err(VisusynthError::Summarization(_))));
    }

    #[test]
    fn clipboard_receives_the_edit() {
        let clipboard = Arc::new(RecordingClipboard::default());
        let mut review = session("a").with_clipboard(clipboard.clone());
        review.set_text("copied text");
        review.copy_to_clipboard().unwrap();
        assert_eq!(*clipboard.copied.lock().unwrap(), vec!["copied text".to_string()]);
    }

    #[test]
    fn clipboard_failures_are_clipboard_errors() {
        let review = session("a").with_clipboard(Arc::new(DeniedClipboard));
        let err = review.copy_to_clipboard().unwrap_err();
        assert!(matches!(err, VisusynthError::Clipboard(_)));
        assert!(!err.is_fatal());
        assert!(session("a").copy_to_clipboard().is_err());
    }
}
