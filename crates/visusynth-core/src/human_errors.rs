// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for notification surfaces (toasts, CLI output).
//
// Every technical error is mapped to a plain-English title with a suggestion.
// Severity drives presentation: fatal run errors are shown as destructive
// notices, degraded stages as warnings.

use crate::error::VisusynthError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run kept going with a prior result.
    Warning,
    /// The user must change something and resubmit.
    ActionRequired,
    /// The run stopped; resubmitting the same input will not help.
    Fatal,
}

/// A human-readable error with a title and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short title (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `VisusynthError` into a `HumanError`.
pub fn humanize_error(err: &VisusynthError) -> HumanError {
    match err {
        VisusynthError::Validation { reason, .. } => HumanError {
            message: "Some files can't be processed.".into(),
            suggestion: reason.clone(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::Decode { file, .. } => HumanError {
            message: format!("{file} couldn't be opened as an image."),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a PNG or JPEG and upload it again.".into(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::Recognition(detail) => HumanError {
            message: "Text extraction failed.".into(),
            suggestion: format!("Try again with clearer scans. ({detail})"),
            severity: Severity::Fatal,
        },

        VisusynthError::Cancelled => HumanError {
            message: "Processing was cancelled.".into(),
            suggestion: "Submit the files again to start over.".into(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::InvalidTransition { .. } => HumanError {
            message: "Processing got into an unexpected state.".into(),
            suggestion: "Submit the files again. If this keeps happening, please report it.".into(),
            severity: Severity::Fatal,
        },

        VisusynthError::Correction(detail) => HumanError {
            message: "AI correction was skipped.".into(),
            suggestion: format!("The uncorrected text is shown instead. ({detail})"),
            severity: Severity::Warning,
        },

        VisusynthError::Summarization(detail) => HumanError {
            message: "Couldn't create a summary.".into(),
            suggestion: detail.clone(),
            severity: Severity::Warning,
        },

        VisusynthError::Render(detail) => HumanError {
            message: "Failed to generate PDF.".into(),
            suggestion: format!("Your text is unchanged; try again. ({detail})"),
            severity: Severity::Warning,
        },

        VisusynthError::Clipboard(_) => HumanError {
            message: "Couldn't copy to the clipboard.".into(),
            suggestion: "Select the text and copy it manually, or download it as a file.".into(),
            severity: Severity::Warning,
        },

        VisusynthError::NotSignedIn => HumanError {
            message: "Please sign in first.".into(),
            suggestion: "Sign in, then submit your documents again.".into(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::Config(detail) => HumanError {
            message: "The settings are invalid.".into(),
            suggestion: detail.clone(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission denied while reading or writing a file.".into(),
                    suggestion: "Check the file permissions, or choose a different location.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Fatal,
                }
            }
        }

        VisusynthError::Serialization(_) => HumanError {
            message: "A settings or data file couldn't be read.".into(),
            suggestion: "Check that the file contains valid JSON.".into(),
            severity: Severity::ActionRequired,
        },

        VisusynthError::PlatformUnavailable => HumanError {
            message: "This feature isn't available here.".into(),
            suggestion: "Some actions need a desktop session or a supported device.".into(),
            severity: Severity::Warning,
        },
    }
}
