// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF renderer: draw a computed `PageLayout` into a searchable PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, info, instrument};
use visusynth_core::error::{Result, VisusynthError};

use super::layout::PageLayout;

/// Renders page layouts as real text (not images), so the output is searchable.
pub struct PdfRenderer {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new("Visusynth Document")
    }
}

impl PdfRenderer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Render one PDF page per layout group, every line at its computed
    /// coordinates in built-in Helvetica.
    ///
    /// # Errors
    ///
    /// Returns [`VisusynthError::Render`] for an empty layout, and for text the
    /// built-in font has no glyph for (Devanagari, for one). Plain text and
    /// Markdown exports carry such text intact.
    #[instrument(skip(self, layout), fields(pages = layout.page_count()))]
    pub fn render(&self, layout: &PageLayout) -> Result<Vec<u8>> {
        if layout.is_empty() {
            return Err(VisusynthError::Render(
                "there is no text to put in the document".into(),
            ));
        }

        info!(title = %self.title, "Rendering PDF");

        let page_w = pt_to_mm(layout.page_width);
        let page_h = pt_to_mm(layout.page_height);
        let mut pages: Vec<PdfPage> = Vec::with_capacity(layout.page_count());
        let mut line_number = 0usize;

        for group in &layout.groups {
            let mut ops: Vec<Op> = Vec::with_capacity(group.lines.len() * 5);

            for (x, y, line) in group.positioned_lines() {
                line_number += 1;
                if line.is_empty() {
                    continue;
                }
                if let Some(c) = line.chars().find(|&c| !builtin_font_can_encode(c)) {
                    return Err(VisusynthError::Render(format!(
                        "the built-in PDF font cannot draw '{c}' (line {line_number}); \
                         export as text or Markdown instead"
                    )));
                }

                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point { x: Pt(x), y: Pt(y) },
                });
                ops.push(Op::SetFontSizeBuiltinFont {
                    size: Pt(group.font_size),
                    font: BuiltinFont::Helvetica,
                });
                ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(line.to_string())],
                    font: BuiltinFont::Helvetica,
                });
                ops.push(Op::EndTextSection);
            }

            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        let mut doc = PdfDocument::new(&self.title);
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(
            pdf_bytes = output.len(),
            warnings = warnings.len(),
            "PDF serialised"
        );

        Ok(output)
    }
}

/// Whether built-in Helvetica (WinAnsiEncoding) has a glyph for `c`.
fn builtin_font_can_encode(c: char) -> bool {
    matches!(c, '\t' | ' '..='~' | '\u{A0}'..='\u{FF}')
        || matches!(
            c,
            '€' | '‚' | 'ƒ' | '„' | '…' | '†' | '‡' | 'ˆ' | '‰' | 'Š' | '‹' | 'Œ' | 'Ž'
                | '‘' | '’' | '“' | '”' | '•' | '–' | '—' | '˜' | '™' | 'š' | '›' | 'œ'
                | 'ž' | 'Ÿ'
        )
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}
