// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning helpers: pre-recognition enhancement and optical character
// recognition (OCR).

pub mod enhance;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use enhance::ImageEnhancer;

#[cfg(feature = "ocr")]
pub use ocr::OcrRecognizer;
