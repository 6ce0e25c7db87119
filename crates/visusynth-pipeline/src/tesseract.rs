// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract adapter: drives the system `tesseract` binary.
//
// Images go in on stdin and text comes back on stdout, so nothing touches the
// filesystem. Opening a session checks the binary and its installed language
// data once; each recognition is one child process.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use visusynth_core::LanguageSpec;
use visusynth_core::error::{Result, VisusynthError};

use crate::engine::{ProgressFn, RecognitionEngine, RecognitionSession};

/// Recognition through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Language packs reported by `tesseract --list-langs`.
    async fn installed_languages(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => VisusynthError::Recognition(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary.display()
                )),
                _ => VisusynthError::Io(err),
            })?;

        if !output.status.success() {
            return Err(VisusynthError::Recognition(format!(
                "tesseract --list-langs failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // Older releases print the list on stderr.
        let mut listing = String::from_utf8_lossy(&output.stdout).into_owned();
        listing.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse_language_list(&listing))
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    #[instrument(skip(self), fields(binary = %self.binary.display()))]
    async fn open_session(&self, language: LanguageSpec) -> Result<Box<dyn RecognitionSession>> {
        let installed = self.installed_languages().await?;
        let missing: Vec<&str> = language
            .code()
            .split('+')
            .filter(|code| !installed.iter().any(|lang| lang == code))
            .collect();
        if !missing.is_empty() {
            return Err(VisusynthError::Recognition(format!(
                "tesseract language data missing for: {}",
                missing.join(", ")
            )));
        }

        info!(language = language.code(), "tesseract session ready");
        Ok(Box::new(TesseractSession {
            binary: self.binary.clone(),
            language,
        }))
    }
}

struct TesseractSession {
    binary: PathBuf,
    language: LanguageSpec,
}

#[async_trait]
impl RecognitionSession for TesseractSession {
    async fn recognize(&mut self, image: &[u8], progress: ProgressFn<'_>) -> Result<String> {
        progress(0.0);

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.code()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                VisusynthError::Recognition(format!(
                    "failed to start {}: {err}",
                    self.binary.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VisusynthError::Recognition("tesseract stdin unavailable".into()))?;
        let payload = image.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| VisusynthError::Recognition(format!("tesseract did not finish: {err}")))?;
        let written = writer.await;

        // The exit status and stderr explain an early exit better than the
        // broken pipe it leaves behind.
        if !output.status.success() {
            return Err(VisusynthError::Recognition(format!(
                "tesseract failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        match written {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("tesseract closed stdin before the whole image was sent");
            }
            Ok(Err(err)) => {
                return Err(VisusynthError::Recognition(format!(
                    "failed to send image to tesseract: {err}"
                )));
            }
            Err(err) => {
                return Err(VisusynthError::Recognition(format!("stdin writer failed: {err}")));
            }
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.chars().count(), "tesseract output read");
        progress(1.0);
        Ok(text)
    }

    async fn terminate(&mut self) -> Result<()> {
        // No resident process between images.
        Ok(())
    }
}

/// Parse `--list-langs` output, skipping the header line.
fn parse_language_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
        .filter(|line| !line.contains(' '))
        .map(str::to_string)
        .collect()
}
