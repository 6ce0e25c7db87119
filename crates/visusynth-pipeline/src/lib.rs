// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visusynth: run orchestration.
//
// Drives a batch of images through enhancement, recognition and optional AI
// correction, publishing progress as it goes, and hands the finished text to a
// review session for editing, summarizing and export.

pub mod correction;
pub mod engine;
pub mod gateway;
#[cfg(feature = "ocr")]
pub mod ocrs_engine;
pub mod orchestrator;
pub mod outcome;
pub mod review;
pub mod run;
pub mod summarize;
pub mod tesseract;

pub use correction::{AiCorrector, CorrectionService};
pub use engine::{EngineSession, RecognitionEngine, RecognitionSession, normalize_recognized_text};
pub use gateway::{AiGateway, GatewayError};
#[cfg(feature = "ocr")]
pub use ocrs_engine::OcrsEngine;
pub use orchestrator::{Orchestrator, RunOutput};
pub use outcome::StageOutcome;
pub use review::ReviewSession;
pub use run::PipelineRun;
pub use summarize::{AiSummarizer, SummarizationService};
pub use tesseract::TesseractEngine;
