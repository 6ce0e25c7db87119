// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config file location.

use std::path::PathBuf;

/// `$XDG_CONFIG_HOME/visusynth/config.json`, falling back to
/// `~/.config/visusynth/config.json`.
pub fn default_config_path() -> PathBuf {
    config_base().join("visusynth").join("config.json")
}

fn config_base() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    PathBuf::from(".")
}
