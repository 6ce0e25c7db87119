// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Visusynth document pipeline.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Result, VisusynthError};

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user-submitted file: raw bytes, declared media type and original name.
///
/// Immutable once accepted into a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    bytes: Vec<u8>,
    media_type: String,
    file_name: String,
}

impl InputImage {
    pub fn new(
        bytes: Vec<u8>,
        media_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(media_type_for_extension)
            .unwrap_or("application/octet-stream");
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(bytes, media_type, file_name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether the declared media type is an image type (`image/*`).
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    /// SHA-256 fingerprint of the raw bytes, hex-encoded.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Declared media type for a file extension.
pub fn media_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// Recognition language: a closed set of supported engine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LanguageSpec {
    /// English-only model.
    #[default]
    #[serde(rename = "eng")]
    English,
    /// Hindi-only model.
    #[serde(rename = "hin")]
    Hindi,
    /// Joint English + Hindi model.
    #[serde(rename = "eng+hin")]
    EnglishHindi,
}

impl LanguageSpec {
    pub const ALL: [LanguageSpec; 3] = [Self::English, Self::Hindi, Self::EnglishHindi];

    /// Engine language code (`eng`, `hin`, `eng+hin`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Hindi => "hin",
            Self::EnglishHindi => "eng+hin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::EnglishHindi => "English + Hindi",
        }
    }

    /// Whether every script in this selection is Latin.
    pub fn is_latin_only(&self) -> bool {
        matches!(self, Self::English)
    }
}

impl FromStr for LanguageSpec {
    type Err = VisusynthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eng" => Ok(Self::English),
            "hin" => Ok(Self::Hindi),
            "eng+hin" => Ok(Self::EnglishHindi),
            other => Err(VisusynthError::Config(format!(
                "unsupported language spec '{other}' (expected eng, hin or eng+hin)"
            ))),
        }
    }
}

impl std::fmt::Display for LanguageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Named switches for the optional pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Run the image enhancer before recognition.
    pub enhance_images: bool,
    /// Send the aggregated text through the correction service.
    pub ai_correction: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enhance_images: true,
            ai_correction: false,
        }
    }
}

/// Text recognized from one input, tagged with its submission position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// 0-based position of the source file in the submitted batch.
    pub index: usize,
    pub file_name: String,
    pub text: String,
}

/// Lifecycle states of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStage {
    Idle,
    Validating,
    Enhancing { index: usize },
    Recognizing { index: usize },
    Correcting,
    Finalized,
    Failed,
    Cancelled,
}

impl RunStage {
    /// Whether the run has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Validating => f.write_str("validating"),
            Self::Enhancing { index } => write!(f, "enhancing({index})"),
            Self::Recognizing { index } => write!(f, "recognizing({index})"),
            Self::Correcting => f.write_str("correcting"),
            Self::Finalized => f.write_str("finalized"),
            Self::Failed => f.write_str("failed"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Observable state of a run, published to the caller after every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub stage: RunStage,
    /// 0..=100.
    pub progress: u8,
    /// Human-readable step label, meant to be shown verbatim.
    pub label: String,
    pub updated_at: DateTime<Utc>,
}

/// Identity supplied by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: Option<String>,
}

/// Summary shown next to the review editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub files_processed: usize,
    pub language: LanguageSpec,
    /// Unicode scalar count of the current edited text.
    pub characters: usize,
}

/// Standard paper sizes for rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions in PDF points (1pt = 1/72 in).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        (mm_to_pt(w as f32), mm_to_pt(h as f32))
    }
}

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}
