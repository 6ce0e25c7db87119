// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments. Flags override values from the config file.

use std::path::PathBuf;

use clap::Parser;
use visusynth_core::LanguageSpec;
use visusynth_core::config::{EngineBackend, PipelineConfig};

/// Turn scanned images into searchable text, markdown and PDF.
#[derive(Debug, Parser)]
#[command(name = "visusynth", version, about)]
pub struct Args {
    /// JSON config file (defaults to the user config directory).
    #[arg(long, env = "VISUSYNTH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recognition language: eng, hin or eng+hin.
    #[arg(long)]
    pub lang: Option<LanguageSpec>,

    /// Skip contrast enhancement and binarization.
    #[arg(long)]
    pub no_enhance: bool,

    /// Send the recognized text through AI correction.
    #[arg(long)]
    pub correct: bool,

    /// Print an AI summary of the final text.
    #[arg(long)]
    pub summarize: bool,

    /// Recognition engine: tesseract or ocrs.
    #[arg(long)]
    pub engine: Option<EngineBackend>,

    /// Directory for the .txt, .md and .pdf outputs.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Images to process, in page order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Args {
    /// Apply flag overrides on top of `config`.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(language) = self.lang {
            config.language = language;
        }
        if self.no_enhance {
            config.features.enhance_images = false;
        }
        if self.correct {
            config.features.ai_correction = true;
        }
        if let Some(engine) = self.engine {
            config.engine.backend = engine;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "visusynth",
            "--lang",
            "eng+hin",
            "--no-enhance",
            "--correct",
            "--out",
            "/tmp/out",
            "a.png",
            "b.jpg",
        ])
        .unwrap();
        let mut config = PipelineConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.language, LanguageSpec::EnglishHindi);
        assert!(!config.features.enhance_images);
        assert!(config.features.ai_correction);
        assert_eq!(config.engine.backend, EngineBackend::Tesseract);
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.out, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let args = Args::try_parse_from(["visusynth", "scan.png"]).unwrap();
        let mut config = PipelineConfig::default();
        config.language = LanguageSpec::Hindi;
        config.features.ai_correction = true;
        args.apply_to(&mut config);
        assert_eq!(config.language, LanguageSpec::Hindi);
        assert!(config.features.ai_correction);
        assert!(config.features.enhance_images);
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(Args::try_parse_from(["visusynth", "--lang", "fra", "scan.png"]).is_err());
    }

    #[test]
    fn files_are_required() {
        assert!(Args::try_parse_from(["visusynth"]).is_err());
    }
}
