// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Visusynth.

use thiserror::Error;

/// Top-level error type for all Visusynth operations.
#[derive(Debug, Error)]
pub enum VisusynthError {
    // -- Run-fatal errors --
    #[error("{reason}")]
    Validation { file: Option<String>, reason: String },

    #[error("could not decode image {file}: {detail}")]
    Decode { file: String, detail: String },

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("invalid run transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // -- Degrading / isolated errors --
    #[error("text correction failed: {0}")]
    Correction(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("document rendering failed: {0}")]
    Render(String),

    #[error("clipboard copy failed: {0}")]
    Clipboard(String),

    // -- Preconditions / configuration --
    #[error("no signed-in user")]
    NotSignedIn,

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl VisusynthError {
    /// Build the validation error raised when a non-image file is submitted.
    pub fn not_an_image(file_name: &str) -> Self {
        Self::Validation {
            file: Some(file_name.to_string()),
            reason: format!(
                "File {file_name} is not an image. Please upload only image files."
            ),
        }
    }

    /// Whether this error stops a pipeline run in the `Failed` state.
    ///
    /// Correction, summarization, rendering and clipboard failures are caught
    /// at their stage boundary and never abort a run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Correction(_)
                | Self::Summarization(_)
                | Self::Render(_)
                | Self::Clipboard(_)
        )
    }

    /// The offending file, when the error is tied to one input.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Validation { file, .. } => file.as_deref(),
            Self::Decode { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VisusynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_image_names_the_file() {
        let err = VisusynthError::not_an_image("notes.txt");
        assert_eq!(
            err.to_string(),
            "File notes.txt is not an image. Please upload only image files."
        );
        assert_eq!(err.file_name(), Some("notes.txt"));
        assert!(err.is_fatal());
    }

    #[test]
    fn degrading_errors_are_not_fatal() {
        assert!(!VisusynthError::Correction("x".into()).is_fatal());
        assert!(!VisusynthError::Summarization("x".into()).is_fatal());
        assert!(!VisusynthError::Render("x".into()).is_fatal());
        assert!(!VisusynthError::Clipboard("x".into()).is_fatal());
        assert!(VisusynthError::Recognition("x".into()).is_fatal());
        assert!(
            VisusynthError::Decode {
                file: "a.png".into(),
                detail: "bad".into()
            }
            .is_fatal()
        );
    }
}
