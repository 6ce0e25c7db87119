// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator.
//
// One run: check the user, validate the whole batch, open one recognition
// session, then for each file in submission order enhance (optional) and
// recognize before touching the next file. The aggregated text may then be
// corrected. Correction failures degrade; everything before it is fatal.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use visusynth_bridge::SessionProvider;
use visusynth_core::config::PipelineConfig;
use visusynth_core::error::{Result, VisusynthError};
use visusynth_core::{InputImage, LanguageSpec, RecognitionResult, RunId, RunStage};
use visusynth_document::ImageEnhancer;

use crate::correction::CorrectionService;
use crate::engine::{EngineSession, RecognitionEngine};
use crate::outcome::StageOutcome;
use crate::run::{PipelineRun, RECOGNITION_PROGRESS_SPAN};

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub language: LanguageSpec,
    pub results: Vec<RecognitionResult>,
    /// Aggregated text before correction.
    pub extracted_text: String,
    /// Text after correction, or `extracted_text` when correction was off or
    /// failed.
    pub text: String,
    pub warnings: Vec<String>,
}

impl RunOutput {
    pub fn files_processed(&self) -> usize {
        self.results.len()
    }
}

/// Drives runs through their stages. Holds only shared collaborators, so one
/// orchestrator can serve many independent runs.
pub struct Orchestrator {
    engine: Arc<dyn RecognitionEngine>,
    sessions: Arc<dyn SessionProvider + Send + Sync>,
    corrector: Option<Arc<dyn CorrectionService>>,
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        sessions: Arc<dyn SessionProvider + Send + Sync>,
    ) -> Self {
        Self {
            engine,
            sessions,
            corrector: None,
        }
    }

    pub fn with_corrector(mut self, corrector: Arc<dyn CorrectionService>) -> Self {
        self.corrector = Some(corrector);
        self
    }

    /// Run the pipeline over the inputs held by `run`.
    ///
    /// Requires a signed-in user; without one the run stays `Idle`. On return
    /// the run is `Finalized`, `Failed` or `Cancelled`, and the recognition
    /// session, if one was opened, has been released.
    #[instrument(skip_all, fields(run_id = %run.id(), files = run.files_total()))]
    pub async fn execute(
        &self,
        run: &mut PipelineRun,
        config: &PipelineConfig,
        cancel: &CancellationToken,
    ) -> Result<RunOutput> {
        let user = self.sessions.current_user().ok_or(VisusynthError::NotSignedIn)?;
        info!(user = %user.id, language = config.language.code(), "run started");

        let total = run.files_total();
        run.transition(RunStage::Validating, format!("Validating {total} file(s)…"))?;
        if let Err(err) = config.validate().and_then(|()| validate_inputs(&run.inputs())) {
            run.fail(&err);
            return Err(err);
        }

        let mut session = match EngineSession::acquire(self.engine.as_ref(), config.language).await {
            Ok(session) => session,
            Err(err) => {
                run.fail(&err);
                return Err(err);
            }
        };
        let recognized = recognize_all(run, &mut session, config, cancel).await;
        session.release().await;

        if let Err(err) = recognized {
            match err {
                VisusynthError::Cancelled => run.cancel(),
                ref other => run.fail(other),
            }
            return Err(err);
        }

        let extracted_text = run.document_text();
        let text = if config.features.ai_correction && !extracted_text.is_empty() {
            run.transition(RunStage::Correcting, "Correcting text with AI…")?;
            let (text, warning) = self.correct(&extracted_text).await.into_result()?;
            if let Some(warning) = warning {
                warn!(%warning, "correction skipped, keeping recognized text");
                run.add_warning(warning);
            }
            text
        } else {
            extracted_text.clone()
        };

        run.transition(RunStage::Finalized, "Processing complete")?;
        info!(chars = text.chars().count(), "run finalized");

        Ok(RunOutput {
            run_id: *run.id(),
            language: config.language,
            results: run.results().to_vec(),
            extracted_text,
            text,
            warnings: run.warnings().to_vec(),
        })
    }

    async fn correct(&self, text: &str) -> StageOutcome<String> {
        let result = match &self.corrector {
            Some(corrector) => corrector.correct(text).await,
            None => Err(VisusynthError::Correction(
                "no correction service is configured".into(),
            )),
        };
        // Whatever a corrector reports, it never ends the run.
        let result = result.map_err(|err| match err {
            VisusynthError::Correction(_) => err,
            other => VisusynthError::Correction(other.to_string()),
        });
        StageOutcome::degrade_on_error(result, || text.to_string())
    }
}

/// Reject an empty batch or the first input that is not an image.
pub fn validate_inputs(inputs: &[InputImage]) -> Result<()> {
    if inputs.is_empty() {
        return Err(VisusynthError::Validation {
            file: None,
            reason: "No files to process. Please upload at least one image.".into(),
        });
    }
    match inputs.iter().find(|input| !input.is_image()) {
        Some(input) => Err(VisusynthError::not_an_image(input.file_name())),
        None => Ok(()),
    }
}

async fn recognize_all(
    run: &mut PipelineRun,
    session: &mut EngineSession,
    config: &PipelineConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let inputs = run.inputs();
    let total = inputs.len();

    for (index, input) in inputs.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(VisusynthError::Cancelled);
        }
        let ordinal = index + 1;

        let image = if config.features.enhance_images {
            run.transition(
                RunStage::Enhancing { index },
                format!("Enhancing file {ordinal} of {total}…"),
            )?;
            tokio::task::yield_now().await;
            enhance(input).await?
        } else {
            input.bytes().to_vec()
        };

        run.transition(
            RunStage::Recognizing { index },
            format!("Extracting text from file {ordinal} of {total}…"),
        )?;
        // Subscribers polled on this thread see every step label.
        tokio::task::yield_now().await;
        let report = run.file_progress_reporter(index);
        let text = session.recognize(&image, &report).await?;

        info!(
            index,
            file = input.file_name(),
            digest = %input.digest(),
            chars = text.chars().count(),
            "file recognized"
        );
        run.record_result(RecognitionResult {
            index,
            file_name: input.file_name().to_string(),
            text,
        })?;
        run.advance_progress(completed_progress(ordinal, total));
    }
    Ok(())
}

/// Decode, enhance and re-encode off the async runtime.
async fn enhance(input: &InputImage) -> Result<Vec<u8>> {
    let bytes = input.bytes().to_vec();
    let file_name = input.file_name().to_string();
    tokio::task::spawn_blocking(move || ImageEnhancer::enhance_bytes(&bytes, &file_name))
        .await
        .map_err(|err| VisusynthError::Decode {
            file: input.file_name().to_string(),
            detail: format!("enhancement task failed: {err}"),
        })?
}

fn completed_progress(completed: usize, total: usize) -> u8 {
    (completed * usize::from(RECOGNITION_PROGRESS_SPAN) / total.max(1)) as u8
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::Ordering;

    use image::{ImageFormat, Rgb, RgbImage};
    use visusynth_core::UserIdentity;

    use super::*;
    use crate::correction::testing::ShoutingCorrector;
    use crate::engine::testing::EchoEngine;

    struct SignedIn(Option<UserIdentity>);

    impl SessionProvider for SignedIn {
        fn current_user(&self) -> Option<UserIdentity> {
            self.0.clone()
        }
    }

    fn signed_in() -> Arc<SignedIn> {
        Arc::new(SignedIn(Some(UserIdentity {
            id: "ada".into(),
            display_name: None,
        })))
    }

    fn orchestrator(engine: &EchoEngine) -> Orchestrator {
        Orchestrator::new(Arc::new(engine.clone()), signed_in())
    }

    /// Inputs whose bytes are their own recognized text.
    fn text_inputs(texts: &[&str]) -> Vec<InputImage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| InputImage::new(text.as_bytes().to_vec(), "image/png", format!("scan-{i}.png")))
            .collect()
    }

    fn raw_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.features.enhance_images = false;
        config
    }

    #[tokio::test]
    async fn results_arrive_in_submission_order() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(text_inputs(&["alpha", "beta", "gamma"]));
        let output = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap();

        let indices: Vec<usize> = output.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            output.text,
            "--- Page 1 ---\n\nalpha\n\n--- Page 2 ---\n\nbeta\n\n--- Page 3 ---\n\ngamma"
        );
        assert_eq!(output.text.matches("--- Page ").count(), 3);
        assert_eq!(run.stage(), RunStage::Finalized);
        assert_eq!(run.progress(), 100);
        assert_eq!(run.snapshot().label, "Processing complete");
    }

    #[tokio::test]
    async fn non_image_fails_before_any_recognition() {
        let engine = EchoEngine::default();
        let mut inputs = text_inputs(&["one", "two", "three"]);
        inputs[1] = InputImage::new(b"%PDF".to_vec(), "application/pdf", "notes.pdf");
        let mut run = PipelineRun::new(inputs);

        let err = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "File notes.pdf is not an image. Please upload only image files."
        );
        assert!(run.results().is_empty());
        assert_eq!(run.stage(), RunStage::Failed);
        assert!(run.snapshot().label.starts_with("Processing failed: File notes.pdf"));
        assert_eq!(engine.opened.load(Ordering::SeqCst), 0);
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_a_validation_error() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(Vec::new());
        let err = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VisusynthError::Validation { file: None, .. }));
        assert_eq!(run.stage(), RunStage::Failed);
    }

    #[tokio::test]
    async fn missing_user_leaves_the_run_idle() {
        let engine = EchoEngine::default();
        let orchestrator = Orchestrator::new(Arc::new(engine.clone()), Arc::new(SignedIn(None)));
        let mut run = PipelineRun::new(text_inputs(&["x"]));
        let err = orchestrator
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VisusynthError::NotSignedIn));
        assert_eq!(run.stage(), RunStage::Idle);
    }

    #[tokio::test]
    async fn engine_failure_stops_the_run_and_releases_the_session() {
        let engine = EchoEngine {
            fail_on_call: Some(1),
            ..EchoEngine::default()
        };
        let mut run = PipelineRun::new(text_inputs(&["one", "two", "three"]));
        let err = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, VisusynthError::Recognition(_)));
        assert_eq!(run.stage(), RunStage::Failed);
        assert_eq!(run.results().len(), 1);
        assert_eq!(engine.seen.lock().unwrap().len(), 1);
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn correction_failure_keeps_the_recognized_text() {
        let engine = EchoEngine::default();
        let mut config = raw_config();
        config.features.ai_correction = true;
        let mut run = PipelineRun::new(text_inputs(&["Hello World"]));

        let output = orchestrator(&engine)
            .with_corrector(Arc::new(ShoutingCorrector::failing()))
            .execute(&mut run, &config, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.stage(), RunStage::Finalized);
        assert_eq!(run.progress(), 100);
        assert_eq!(output.text, output.extracted_text);
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("AI API error: 503"));
    }

    #[tokio::test]
    async fn correction_replaces_the_text_when_it_succeeds() {
        let engine = EchoEngine::default();
        let mut config = raw_config();
        config.features.ai_correction = true;
        let mut run = PipelineRun::new(text_inputs(&["Hello World"]));
        let mut rx = run.subscribe();

        let output = orchestrator(&engine)
            .with_corrector(Arc::new(ShoutingCorrector::working()))
            .execute(&mut run, &config, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.text, "--- PAGE 1 ---\n\nHELLO WORLD");
        assert_eq!(output.extracted_text, "--- Page 1 ---\n\nHello World");
        assert!(output.warnings.is_empty());
        assert_eq!(rx.borrow_and_update().stage, RunStage::Finalized);
    }

    #[tokio::test]
    async fn correction_without_a_service_degrades() {
        let engine = EchoEngine::default();
        let mut config = raw_config();
        config.features.ai_correction = true;
        let mut run = PipelineRun::new(text_inputs(&["   "]));
        let output = orchestrator(&engine)
            .execute(&mut run, &config, &CancellationToken::new())
            .await
            .unwrap();
        // A blank page still contributes its marker.
        assert_eq!(output.text, "--- Page 1 ---");
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("no correction service"));
        assert_eq!(run.stage(), RunStage::Finalized);
    }

    #[tokio::test]
    async fn round_trip_document_lays_out_on_one_page() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(text_inputs(&["Hello World", "Second Page"]));
        let output = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            output.text,
            "--- Page 1 ---\n\nHello World\n\n--- Page 2 ---\n\nSecond Page"
        );
        let layout = visusynth_document::layout(&output.text, 50);
        assert_eq!(layout.page_count(), 1);
        let lines: Vec<&str> = layout.lines().filter(|line| !line.is_empty()).collect();
        assert_eq!(lines, vec!["--- Page 1 ---", "Hello World", "--- Page 2 ---", "Second Page"]);
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_files() {
        let engine = EchoEngine::default();
        let token = CancellationToken::new();
        token.cancel();
        let mut run = PipelineRun::new(text_inputs(&["one", "two"]));
        let err = orchestrator(&engine)
            .execute(&mut run, &raw_config(), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, VisusynthError::Cancelled));
        assert_eq!(run.stage(), RunStage::Cancelled);
        assert_eq!(run.snapshot().label, "Processing cancelled");
        assert!(run.results().is_empty());
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }

    /// Record every `(progress, label)` a subscriber observes until the run
    /// ends, dropping consecutive repeats.
    fn record_steps(run: &PipelineRun) -> tokio::task::JoinHandle<Vec<(u8, String)>> {
        let mut rx = run.subscribe();
        tokio::spawn(async move {
            let mut steps: Vec<(u8, String)> = Vec::new();
            while rx.changed().await.is_ok() {
                let snap = rx.borrow_and_update().clone();
                let step = (snap.progress, snap.label);
                if steps.last() != Some(&step) {
                    steps.push(step);
                }
                if snap.stage.is_terminal() {
                    break;
                }
            }
            steps
        })
    }

    #[tokio::test]
    async fn subscribers_see_each_step_with_its_progress() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(text_inputs(&["a", "b", "c"]));
        let steps = record_steps(&run);

        orchestrator(&engine)
            .execute(&mut run, &raw_config(), &CancellationToken::new())
            .await
            .unwrap();
        let steps = steps.await.unwrap();

        let expected: Vec<(u8, String)> = [
            (0, "Validating 3 file(s)…"),
            (0, "Extracting text from file 1 of 3…"),
            (15, "Extracting text from file 1 of 3…"),
            (30, "Extracting text from file 1 of 3…"),
            (30, "Extracting text from file 2 of 3…"),
            (45, "Extracting text from file 2 of 3…"),
            (60, "Extracting text from file 2 of 3…"),
            (60, "Extracting text from file 3 of 3…"),
            (75, "Extracting text from file 3 of 3…"),
            (90, "Extracting text from file 3 of 3…"),
            (100, "Processing complete"),
        ]
        .into_iter()
        .map(|(progress, label)| (progress, label.to_string()))
        .collect();
        assert_eq!(steps, expected);
    }

    #[tokio::test]
    async fn enhancement_steps_precede_each_extraction() {
        let engine = EchoEngine::default();
        let png = grey_png();
        let mut run = PipelineRun::new(vec![
            InputImage::new(png.clone(), "image/png", "first.png"),
            InputImage::new(png, "image/png", "second.png"),
        ]);
        let steps = record_steps(&run);

        orchestrator(&engine)
            .execute(&mut run, &PipelineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();
        let steps = steps.await.unwrap();

        let mut labels: Vec<String> = steps.into_iter().map(|(_, label)| label).collect();
        labels.dedup();
        assert_eq!(
            labels,
            vec![
                "Validating 2 file(s)…",
                "Enhancing file 1 of 2…",
                "Extracting text from file 1 of 2…",
                "Enhancing file 2 of 2…",
                "Extracting text from file 2 of 2…",
                "Processing complete",
            ]
        );
    }

    fn grey_png() -> Vec<u8> {
        let mut png = Vec::new();
        RgbImage::from_pixel(4, 3, Rgb([200, 200, 200]))
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        png
    }

    #[tokio::test]
    async fn enhancement_feeds_binarized_png_to_the_engine() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(vec![InputImage::new(grey_png(), "image/png", "grey.png")]);

        orchestrator(&engine)
            .execute(&mut run, &PipelineConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap();
        let decoded = image::load_from_memory(&seen[0]).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert!(decoded.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn undecodable_image_fails_the_run() {
        let engine = EchoEngine::default();
        let mut run = PipelineRun::new(vec![InputImage::new(b"garbage".to_vec(), "image/png", "broken.png")]);
        let err = orchestrator(&engine)
            .execute(&mut run, &PipelineConfig::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VisusynthError::Decode { ref file, .. } if file == "broken.png"));
        assert_eq!(run.stage(), RunStage::Failed);
        assert_eq!(engine.released.load(Ordering::SeqCst), 1);
    }
}
