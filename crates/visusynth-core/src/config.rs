// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VisusynthError};
use crate::types::{FeatureFlags, LanguageSpec, PaperSize};

/// Settings for one pipeline invocation, validated at run start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Recognition language.
    pub language: LanguageSpec,
    /// Optional stage switches.
    pub features: FeatureFlags,
    /// Page layout for rendered output.
    pub layout: LayoutSettings,
    /// AI gateway used by correction and summarization.
    pub gateway: GatewayConfig,
    /// Recognition engine selection.
    pub engine: EngineConfig,
}

/// Pagination and draw settings for the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Maximum lines per page.
    pub lines_per_page: usize,
    /// Font size in points.
    pub font_size: f32,
    /// Line pitch as a multiple of the font size.
    pub line_height_factor: f32,
    /// Left and top margin in points.
    pub margin: f32,
    pub paper_size: PaperSize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            lines_per_page: 50,
            font_size: 12.0,
            line_height_factor: 1.2,
            margin: 50.0,
            paper_size: PaperSize::A4,
        }
    }
}

impl LayoutSettings {
    /// Distance between consecutive baselines, in points.
    pub fn line_pitch(&self) -> f32 {
        self.font_size * self.line_height_factor
    }

    pub fn validate(&self) -> Result<()> {
        if self.lines_per_page == 0 {
            return Err(VisusynthError::Config(
                "layout.lines_per_page must be at least 1".into(),
            ));
        }
        if !is_positive(self.font_size) || !is_positive(self.line_height_factor) {
            return Err(VisusynthError::Config(
                "layout.font_size and layout.line_height_factor must be positive".into(),
            ));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(VisusynthError::Config(
                "layout.margin must not be negative".into(),
            ));
        }
        let (width, height) = self.paper_size.dimensions_pt();
        if self.margin * 2.0 >= width.min(height) {
            return Err(VisusynthError::Config(format!(
                "layout.margin {} does not fit on a {:?} page",
                self.margin, self.paper_size
            )));
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// OpenAI-compatible chat-completions gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Environment variable holding the bearer key.
    pub api_key_env: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ai.gateway.lovable.dev/v1/chat/completions".into(),
            model: "google/gemini-2.5-flash".into(),
            api_key_env: "VISUSYNTH_AI_API_KEY".into(),
        }
    }
}

impl GatewayConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Which recognition backend drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineBackend {
    /// System `tesseract` binary.
    #[default]
    Tesseract,
    /// Pure-Rust `ocrs` engine (requires the `ocr` feature).
    Ocrs,
}

impl std::str::FromStr for EngineBackend {
    type Err = VisusynthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ocrs" => Ok(Self::Ocrs),
            other => Err(VisusynthError::Config(format!(
                "unknown engine backend '{other}' (expected tesseract or ocrs)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: EngineBackend,
    /// Directory holding `ocrs` model files; the ocrs cache dir when unset.
    pub model_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load a JSON config file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        info!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if self.features.ai_correction && self.gateway.endpoint.trim().is_empty() {
            return Err(VisusynthError::Config(
                "ai_correction is enabled but gateway.endpoint is empty".into(),
            ));
        }
        if self.engine.backend == EngineBackend::Ocrs && !self.language.is_latin_only() {
            return Err(VisusynthError::Config(format!(
                "the ocrs engine only reads Latin script; language '{}' needs tesseract",
                self.language
            )));
        }
        Ok(())
    }
}
