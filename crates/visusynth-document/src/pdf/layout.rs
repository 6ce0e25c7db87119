// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout: split finalized text into fixed-capacity line groups and
// compute where each line is drawn.
//
// Layout is a pure function of the text and settings. There is no cached or
// incremental state: every call recomputes every page.

use serde::Serialize;
use tracing::{debug, instrument};
use visusynth_core::config::LayoutSettings;

/// One output page: a run of consecutive source lines plus draw coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGroup {
    /// 1-based page number.
    pub page_number: usize,
    /// Index of this group's first line in the full line sequence.
    pub first_line: usize,
    pub lines: Vec<String>,
    /// Left edge of every line, in points.
    pub origin_x: f32,
    /// Baseline of the first line, in points from the page bottom.
    pub origin_y: f32,
    /// Vertical distance between baselines.
    pub line_pitch: f32,
    pub font_size: f32,
}

impl PageGroup {
    /// Baseline of the `k`-th line on this page.
    pub fn baseline(&self, k: usize) -> f32 {
        self.origin_y - k as f32 * self.line_pitch
    }

    /// `(x, y, text)` for each line, top to bottom.
    pub fn positioned_lines(&self) -> impl Iterator<Item = (f32, f32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(k, line)| (self.origin_x, self.baseline(k), line.as_str()))
    }
}

/// Ordered page groups for a whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub groups: Vec<PageGroup>,
    /// Page size in points.
    pub page_width: f32,
    pub page_height: f32,
}

impl PageLayout {
    /// Lay out `text` with the given settings.
    ///
    /// Lines are the `\n`-separated pieces of the text, kept verbatim (blank
    /// lines included). Empty text yields zero pages.
    #[instrument(skip(text, settings), fields(text_len = text.len(), capacity = settings.lines_per_page))]
    pub fn build(text: &str, settings: &LayoutSettings) -> Self {
        let (page_width, page_height) = settings.paper_size.dimensions_pt();
        let capacity = settings.lines_per_page.max(1);

        let groups = if text.is_empty() {
            Vec::new()
        } else {
            let lines: Vec<&str> = text.split('\n').collect();
            lines
                .chunks(capacity)
                .enumerate()
                .map(|(page, chunk)| PageGroup {
                    page_number: page + 1,
                    first_line: page * capacity,
                    lines: chunk.iter().map(|line| line.to_string()).collect(),
                    origin_x: settings.margin,
                    origin_y: page_height - settings.margin,
                    line_pitch: settings.line_pitch(),
                    font_size: settings.font_size,
                })
                .collect()
        };

        debug!(pages = groups.len(), "Layout computed");
        Self {
            groups,
            page_width,
            page_height,
        }
    }

    pub fn page_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every line in document order, across all pages.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|group| group.lines.iter().map(String::as_str))
    }
}

/// Lay out `text` in groups of at most `capacity` lines using the default
/// font, pitch, margin and paper size.
pub fn layout(text: &str, capacity: usize) -> PageLayout {
    let settings = LayoutSettings {
        lines_per_page: capacity,
        ..LayoutSettings::default()
    };
    PageLayout::build(text, &settings)
}
