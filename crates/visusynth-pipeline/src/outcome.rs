// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage outcomes: how a stage reports success, tolerated failure, or a
// failure that ends the run.

use visusynth_core::error::{Result, VisusynthError};

/// Result of one pipeline stage.
#[derive(Debug)]
pub enum StageOutcome<T> {
    /// The stage did what it was asked.
    Ok(T),
    /// The stage failed but the run continues with `value` (usually the
    /// stage's input) and records `warning`.
    Degraded { value: T, warning: String },
    /// The run stops.
    Fatal(VisusynthError),
}

impl<T> StageOutcome<T> {
    /// Non-fatal errors fall back to `fallback`; fatal ones still end the run.
    pub fn degrade_on_error(result: Result<T>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) if !err.is_fatal() => Self::Degraded {
                value: fallback(),
                warning: err.to_string(),
            },
            Err(err) => Self::Fatal(err),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Degraded { warning, .. } => Some(warning),
            _ => None,
        }
    }

    /// Split into the carried value and an optional warning.
    pub fn into_result(self) -> Result<(T, Option<String>)> {
        match self {
            Self::Ok(value) => Ok((value, None)),
            Self::Degraded { value, warning } => Ok((value, Some(warning))),
            Self::Fatal(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_fatal_errors_degrade_to_the_fallback() {
        let outcome = StageOutcome::degrade_on_error(
            Err(VisusynthError::Correction("AI API error: 500".into())),
            || "original".to_string(),
        );
        assert_eq!(outcome.warning(), Some("text correction failed: AI API error: 500"));
        let (value, warning) = outcome.into_result().unwrap();
        assert_eq!(value, "original");
        assert!(warning.is_some());
    }

    #[test]
    fn fatal_errors_are_not_degraded() {
        let outcome: StageOutcome<String> = StageOutcome::degrade_on_error(
            Err(VisusynthError::Recognition("boom".into())),
            String::new,
        );
        assert!(outcome.is_fatal());
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn success_passes_through_without_a_warning() {
        let outcome = StageOutcome::degrade_on_error(Ok::<_, VisusynthError>(7), || 0);
        assert!(!outcome.is_fatal());
        assert_eq!(outcome.warning(), None);
        assert_eq!(outcome.into_result().unwrap(), (7, None));
    }
}
