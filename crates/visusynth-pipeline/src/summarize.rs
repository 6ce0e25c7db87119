// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Summarization of finalized text. Runs only on request, after a run has
// finished, and never changes run state.

use async_trait::async_trait;
use tracing::{info, instrument};
use visusynth_core::error::{Result, VisusynthError};

use crate::gateway::{AiGateway, GatewayError};

/// The stage refuses texts shorter than this many characters.
pub const MIN_SUMMARY_CHARS: usize = 100;

const SUMMARY_PROMPT: &str = "\
You summarize documents that were extracted from scanned images.
Write a concise summary of the main points in the same language as the input.
Do not invent facts that are not in the text.
Return ONLY the summary, no preamble.";

#[async_trait]
pub trait SummarizationService: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Check the length precondition, call the service, and fold every failure
/// into [`VisusynthError::Summarization`].
#[instrument(skip_all, fields(chars = text.chars().count()))]
pub async fn summarize_text(service: &dyn SummarizationService, text: &str) -> Result<String> {
    if text.trim().chars().count() < MIN_SUMMARY_CHARS {
        return Err(VisusynthError::Summarization(format!(
            "Text is too short to summarize (at least {MIN_SUMMARY_CHARS} characters are needed)"
        )));
    }
    service.summarize(text).await.map_err(|err| match err {
        VisusynthError::Summarization(_) => err,
        other => VisusynthError::Summarization(other.to_string()),
    })
}

/// Summarization through the chat-completions gateway.
pub struct AiSummarizer {
    gateway: AiGateway,
}

impl AiSummarizer {
    pub fn new(gateway: AiGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SummarizationService for AiSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let summary = self
            .gateway
            .complete(SUMMARY_PROMPT, text)
            .await
            .map_err(|err| match err {
                GatewayError::EmptyResponse => {
                    VisusynthError::Summarization("No summary received from AI".into())
                }
                other => VisusynthError::Summarization(other.to_string()),
            })?;
        info!(model = self.gateway.model(), "summary generated");
        Ok(summary)
    }
}
