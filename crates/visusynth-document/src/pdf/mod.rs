// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: page layout and rendering of finalized text.

pub mod layout;
pub mod writer;

pub use layout::{PageGroup, PageLayout, layout};
pub use writer::PdfRenderer;
