// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AI correction of recognized text.

use async_trait::async_trait;
use tracing::{info, instrument};
use visusynth_core::error::{Result, VisusynthError};

use crate::gateway::{AiGateway, GatewayError};

/// Texts shorter than this many characters are not worth sending.
pub const MIN_CORRECTION_CHARS: usize = 10;

const CORRECTION_PROMPT: &str = "\
You are an OCR text correction assistant. Your job is to:
1. Fix spelling errors and OCR mistakes
2. Correct common OCR errors (like \"rn\" misread as \"m\", \"l\" as \"I\", etc.)
3. Preserve the original formatting and line breaks
4. Fix punctuation and capitalization where clearly wrong
5. Keep all numbers and special characters intact
6. Do NOT add, remove, or rearrange sentences
7. Do NOT translate or paraphrase
8. Return ONLY the corrected text, no explanations

Preserve the exact structure and format of the input.";

/// Turns recognized text into corrected text.
///
/// Every failure is a [`VisusynthError::Correction`]; the pipeline keeps the
/// uncorrected text when one occurs.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn correct(&self, text: &str) -> Result<String>;
}

/// Correction through the chat-completions gateway.
pub struct AiCorrector {
    gateway: AiGateway,
}

impl AiCorrector {
    pub fn new(gateway: AiGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl CorrectionService for AiCorrector {
    #[instrument(skip_all, fields(chars = text.chars().count()))]
    async fn correct(&self, text: &str) -> Result<String> {
        if text.chars().count() < MIN_CORRECTION_CHARS {
            return Err(VisusynthError::Correction(
                "Text is too short to correct".into(),
            ));
        }

        let corrected = self
            .gateway
            .complete(CORRECTION_PROMPT, text)
            .await
            .map_err(|err| match err {
                GatewayError::EmptyResponse => {
                    VisusynthError::Correction("No corrected text received from AI".into())
                }
                other => VisusynthError::Correction(other.to_string()),
            })?;

        info!(model = self.gateway.model(), "text correction completed");
        Ok(corrected)
    }
}
