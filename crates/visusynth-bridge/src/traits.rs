// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for host capabilities.

use std::path::PathBuf;

use visusynth_core::UserIdentity;
use visusynth_core::error::Result;

/// Unified bridge grouping every host capability.
pub trait PlatformBridge: SessionProvider + NativeClipboard + DownloadSink + Send + Sync {
    /// Human-readable platform name (e.g. "Desktop (stub)").
    fn platform_name(&self) -> &str;
}

/// Supplies the signed-in user, if any.
///
/// A run must not start without an identity.
pub trait SessionProvider {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Write text to the system clipboard.
pub trait NativeClipboard {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// Hand a finished file to the user.
pub trait DownloadSink {
    /// Deliver `bytes` under `file_name`; returns where the file ended up.
    fn save_download(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<PathBuf>;
}
