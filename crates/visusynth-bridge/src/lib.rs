// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Visusynth: platform collaborators the pipeline calls into.
//
// Identity, clipboard and file downloads belong to whatever surface hosts the
// pipeline (desktop shell, browser, CLI). The traits here are the only thing
// the pipeline sees; `StubBridge` serves desktop and CI builds.

pub mod stub;
pub mod traits;

pub use stub::StubBridge;
pub use traits::{DownloadSink, NativeClipboard, PlatformBridge, SessionProvider};
