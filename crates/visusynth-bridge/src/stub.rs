// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds.
//
// Identity comes from the environment, downloads land in a directory, and the
// clipboard is unavailable.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use visusynth_core::UserIdentity;
use visusynth_core::error::{Result, VisusynthError};

use crate::traits::*;

/// Environment variable naming the local user; `USER` is the fallback.
pub const USER_ENV: &str = "VISUSYNTH_USER";

/// Bridge used where no native shell is present.
pub struct StubBridge {
    download_dir: PathBuf,
}

impl StubBridge {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl SessionProvider for StubBridge {
    fn current_user(&self) -> Option<UserIdentity> {
        [USER_ENV, "USER"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|name| !name.trim().is_empty())
            .map(|name| UserIdentity {
                id: name.trim().to_string(),
                display_name: None,
            })
    }
}

impl NativeClipboard for StubBridge {
    fn write_text(&self, _text: &str) -> Result<()> {
        warn!("NativeClipboard::write_text called on stub bridge");
        Err(VisusynthError::PlatformUnavailable)
    }
}

impl DownloadSink for StubBridge {
    fn save_download(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf> {
        // Only the final path component is honoured.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| {
                VisusynthError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid download name '{file_name}'"),
                ))
            })?;
        std::fs::create_dir_all(&self.download_dir)?;
        let path = self.download_dir.join(name);
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), mime_type, bytes = bytes.len(), "download saved");
        Ok(path)
    }
}
