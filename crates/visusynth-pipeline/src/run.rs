// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-invocation run state.
//
// Stage, progress and label live in a `watch` channel so callers can observe
// the run while the orchestrator drives it. Every stage change goes through
// `PipelineRun::transition`, which rejects moves the lifecycle does not allow.
//
//   Idle → Validating → [Enhancing(i) →] Recognizing(i) → … → [Correcting →] Finalized
//   Validating | Enhancing | Recognizing → Failed
//   Validating | Enhancing | Recognizing → Cancelled

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};
use visusynth_core::error::{Result, VisusynthError};
use visusynth_core::{InputImage, RecognitionResult, RunId, RunSnapshot, RunStage};

/// Share of the progress bar reserved for the per-file loop.
pub const RECOGNITION_PROGRESS_SPAN: u8 = 90;

/// Marker inserted before each file's text in the aggregated document.
pub fn page_marker(page_number: usize) -> String {
    format!("\n\n--- Page {page_number} ---\n\n")
}

/// State of one pipeline invocation. Never persisted.
pub struct PipelineRun {
    id: RunId,
    inputs: Arc<[InputImage]>,
    document: String,
    results: Vec<RecognitionResult>,
    warnings: Vec<String>,
    snapshots: Arc<watch::Sender<RunSnapshot>>,
}

impl PipelineRun {
    /// A fresh run over `inputs`, in `Idle`.
    pub fn new(inputs: Vec<InputImage>) -> Self {
        let id = RunId::new();
        let (tx, _rx) = watch::channel(RunSnapshot {
            run_id: id,
            stage: RunStage::Idle,
            progress: 0,
            label: String::new(),
            updated_at: Utc::now(),
        });
        Self {
            id,
            inputs: inputs.into(),
            document: String::new(),
            results: Vec::new(),
            warnings: Vec::new(),
            snapshots: Arc::new(tx),
        }
    }

    pub fn id(&self) -> &RunId {
        &self.id
    }

    /// Observe stage, progress and label changes.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn stage(&self) -> RunStage {
        self.snapshots.borrow().stage
    }

    pub fn progress(&self) -> u8 {
        self.snapshots.borrow().progress
    }

    pub fn files_total(&self) -> usize {
        self.inputs.len()
    }

    pub(crate) fn inputs(&self) -> Arc<[InputImage]> {
        Arc::clone(&self.inputs)
    }

    /// Results so far, in submission order.
    pub fn results(&self) -> &[RecognitionResult] {
        &self.results
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The aggregated document: every result behind its page marker, with
    /// surrounding whitespace trimmed.
    pub fn document_text(&self) -> String {
        self.document.trim().to_string()
    }

    /// Move to `to`, publishing `label`. Progress is left alone.
    pub(crate) fn transition(&mut self, to: RunStage, label: impl Into<String>) -> Result<()> {
        let from = self.stage();
        if !is_valid_transition(from, to, self.files_total()) {
            return Err(VisusynthError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let label = label.into();
        debug!(run_id = %self.id, %from, %to, %label, "run transition");
        self.snapshots.send_modify(|snap| {
            snap.stage = to;
            snap.label = label;
            if to == RunStage::Finalized {
                snap.progress = 100;
            }
            snap.updated_at = Utc::now();
        });
        Ok(())
    }

    /// Raise progress to `percent`. Lower values are ignored.
    pub(crate) fn advance_progress(&self, percent: u8) {
        publish_progress(&self.snapshots, percent);
    }

    /// Reporter that maps an engine's per-file fraction onto overall progress
    /// for file `index`.
    pub(crate) fn file_progress_reporter(&self, index: usize) -> impl Fn(f32) + Send + Sync + use<> {
        let tx = Arc::clone(&self.snapshots);
        let total = self.files_total();
        move |fraction| publish_progress(&tx, file_progress(index, fraction, total))
    }

    /// Append one file's text. Results must arrive in submission order.
    pub(crate) fn record_result(&mut self, result: RecognitionResult) -> Result<()> {
        if result.index != self.results.len() {
            return Err(VisusynthError::InvalidTransition {
                from: format!("result {}", self.results.len()),
                to: format!("result {}", result.index),
            });
        }
        self.document.push_str(&page_marker(result.index + 1));
        self.document.push_str(&result.text);
        self.results.push(result);
        Ok(())
    }

    pub(crate) fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Enter `Failed` with a label carrying the error. A run that can no longer
    /// fail (already terminal) keeps its stage.
    pub(crate) fn fail(&mut self, err: &VisusynthError) {
        if self.transition(RunStage::Failed, format!("Processing failed: {err}")).is_ok() {
            info!(run_id = %self.id, error = %err, "run failed");
        }
    }

    /// Enter `Cancelled`.
    pub(crate) fn cancel(&mut self) {
        if self.transition(RunStage::Cancelled, "Processing cancelled").is_ok() {
            info!(run_id = %self.id, "run cancelled");
        }
    }
}

fn publish_progress(tx: &watch::Sender<RunSnapshot>, percent: u8) {
    let percent = percent.min(100);
    tx.send_if_modified(|snap| {
        if percent > snap.progress {
            snap.progress = percent;
            snap.updated_at = Utc::now();
            true
        } else {
            false
        }
    });
}

/// `floor(((index + fraction) / total) * 90)`, with `fraction` clamped to
/// `[0, 1]`.
pub fn file_progress(index: usize, fraction: f32, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let fraction = f64::from(fraction.clamp(0.0, 1.0));
    let span = f64::from(RECOGNITION_PROGRESS_SPAN);
    let value = ((index as f64 + fraction) * span / total as f64).floor();
    value.clamp(0.0, span) as u8
}

/// Lifecycle rules for a run over `total` files.
pub fn is_valid_transition(from: RunStage, to: RunStage, total: usize) -> bool {
    use RunStage::*;

    let last = total.checked_sub(1);
    match (from, to) {
        (Idle, Validating) => true,
        (Validating, Enhancing { index: 0 } | Recognizing { index: 0 }) => total > 0,
        (Enhancing { index: i }, Recognizing { index: j }) => i == j,
        (Recognizing { index: i }, Enhancing { index: j } | Recognizing { index: j }) => {
            j == i + 1 && j < total
        }
        (Recognizing { index: i }, Correcting | Finalized) => Some(i) == last,
        (Correcting, Finalized) => true,
        (Validating | Enhancing { .. } | Recognizing { .. }, Failed | Cancelled) => true,
        _ => false,
    }
}
