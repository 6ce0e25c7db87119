// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// visusynth-document: Document processing for the Visusynth pipeline.
//
// Provides the pre-recognition image enhancer, the page layout engine that
// splits finalized text into fixed-capacity pages, the PDF rendering sink,
// and plain-text / markdown export.

pub mod export;
pub mod pdf;
pub mod scan;

// Re-export the primary types so callers can use `visusynth_document::ImageEnhancer` etc.
pub use pdf::layout::{PageGroup, PageLayout, layout};
pub use pdf::writer::PdfRenderer;
pub use scan::enhance::ImageEnhancer;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrRecognizer;
