// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export helpers: plain text and lightly structured markdown.
//
// Pure functions over the finalized text; none of them touch run state.

use serde::Serialize;

/// Default download name for plain-text export.
pub const TEXT_FILE_NAME: &str = "extracted-text.txt";
/// Default download name for markdown export.
pub const MARKDOWN_FILE_NAME: &str = "extracted-text.md";

/// Paragraphs shorter than this (in characters) may be promoted to headings.
const HEADING_MAX_CHARS: usize = 50;

/// A file ready to hand to a download sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// The text exactly as edited, as `text/plain`.
pub fn plain_text(text: &str) -> ExportArtifact {
    ExportArtifact {
        file_name: TEXT_FILE_NAME.to_string(),
        mime_type: "text/plain",
        bytes: text.as_bytes().to_vec(),
    }
}

/// The text converted by [`to_markdown`], as `text/markdown`.
pub fn markdown(text: &str) -> ExportArtifact {
    ExportArtifact {
        file_name: MARKDOWN_FILE_NAME.to_string(),
        mime_type: "text/markdown",
        bytes: to_markdown(text).into_bytes(),
    }
}

/// Wrap rendered PDF bytes with a timestamped name (`visusynth-<millis>.pdf`).
pub fn pdf(bytes: Vec<u8>, unix_millis: i64) -> ExportArtifact {
    ExportArtifact {
        file_name: format!("visusynth-{unix_millis}.pdf"),
        mime_type: "application/pdf",
        bytes,
    }
}

/// Convert plain text to markdown.
///
/// Paragraphs are separated by a blank line (`\n\n`). A paragraph shorter than
/// 50 characters that is unchanged by upper-casing becomes a `## ` heading;
/// every other paragraph passes through. Each paragraph is followed by a
/// newline and paragraphs are joined with another.
pub fn to_markdown(text: &str) -> String {
    text.split("\n\n")
        .map(|para| {
            if is_heading(para) {
                format!("## {para}\n")
            } else {
                format!("{para}\n")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_heading(para: &str) -> bool {
    para.chars().count() < HEADING_MAX_CHARS && para == para.to_uppercase()
}
