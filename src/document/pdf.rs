//! PDF access: lopdf for the document structure, pdf-extract for the page
//! contents.
//!
//! `pdf_extract::output_doc` interprets every content stream and resolves
//! font encodings (`/Encoding`, `/Differences`, `/ToUnicode`, CID fonts).
//! `LayoutSink` receives each decoded character with its text rendering
//! matrix and each painted path, and turns them into positioned glyphs and
//! ruling lines with a top-left origin.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::Document;
use pdf_extract::{ColorSpace, MediaBox, OutputDev, OutputError, PathOp, Transform};
use tracing::debug;

use super::layout::{Glyph, PageLayout, Ruling};
use crate::error::{Result, SanctionsError};

/// Fraction of the font size above / below the baseline.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// Painted segments shorter than this are not rulings.
const MIN_RULING_LENGTH: f32 = 1.0;

/// An opened PDF file.
pub struct PdfDocument {
    path: PathBuf,
    doc: Document,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let doc = Document::load(path).map_err(|e| SanctionsError::pdf(path, e))?;
        Ok(PdfDocument {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Page numbers (1-based) in document order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    /// Every page, in order, as positioned glyphs and rulings.
    pub fn layouts(&self) -> Result<Vec<PageLayout>> {
        let mut sink = LayoutSink::default();

        // pdf-extract panics on some malformed fonts; contain it to this document
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&self.doc, &mut sink)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SanctionsError::extraction(&self.path, e.to_string())),
            Err(_) => {
                return Err(SanctionsError::extraction(
                    &self.path,
                    "content stream interpretation panicked",
                ))
            }
        }

        let pages = sink.finish();
        for page in &pages {
            debug!(
                "Page {} of {}: {} glyphs, {} rulings",
                page.number,
                self.path.display(),
                page.glyphs().len(),
                page.rulings().len()
            );
        }
        Ok(pages)
    }
}

// ============================================================================
// OUTPUT DEVICE
// ============================================================================

/// Page under construction, in the page's own coordinates.
struct PageBuilder {
    number: u32,
    llx: f64,
    ury: f64,
    width: f32,
    height: f32,
    glyphs: Vec<Glyph>,
    rulings: Vec<Ruling>,
}

impl PageBuilder {
    fn new(number: u32, media_box: &MediaBox) -> Self {
        PageBuilder {
            number,
            llx: media_box.llx,
            ury: media_box.ury,
            width: (media_box.urx - media_box.llx).abs() as f32,
            height: (media_box.ury - media_box.lly).abs() as f32,
            glyphs: Vec::new(),
            rulings: Vec::new(),
        }
    }

    /// Device-space point to top-left page coordinates
    fn to_page(&self, x: f64, y: f64) -> (f32, f32) {
        ((x - self.llx) as f32, (self.ury - y) as f32)
    }

    /// `width` is the advance in text space units (fractions of an em).
    /// Multi-character strings (ligatures) share the advance evenly.
    fn push_text(&mut self, trm: &Transform, width: f64, font_size: f64, text: &str) {
        let scale_x = (trm.m11 * trm.m11 + trm.m12 * trm.m12).sqrt();
        let scale_y = (trm.m21 * trm.m21 + trm.m22 * trm.m22).sqrt();
        let size = (font_size * scale_y) as f32;
        let advance = (width * font_size * scale_x) as f32;

        let chars: Vec<char> = text.chars().filter(|c| !c.is_control()).collect();
        if chars.is_empty() {
            return;
        }

        let (x, baseline) = self.to_page(trm.m31, trm.m32);
        let top = baseline - size * ASCENT;
        let step = advance / chars.len() as f32;
        for (i, ch) in chars.into_iter().enumerate() {
            self.glyphs.push(Glyph::new(
                ch,
                x + i as f32 * step,
                top,
                step,
                size * (ASCENT + DESCENT),
            ));
        }
    }

    /// Straight segments of a painted path, kept when axis-aligned
    fn push_path(&mut self, ctm: &Transform, path: &pdf_extract::Path) {
        let device = |x: f64, y: f64| {
            (
                x * ctm.m11 + y * ctm.m21 + ctm.m31,
                x * ctm.m12 + y * ctm.m22 + ctm.m32,
            )
        };

        let mut segments: Vec<((f64, f64), (f64, f64))> = Vec::new();
        let mut current: Option<(f64, f64)> = None;
        let mut start: Option<(f64, f64)> = None;

        for op in &path.ops {
            match *op {
                PathOp::MoveTo(x, y) => {
                    current = Some(device(x, y));
                    start = current;
                }
                PathOp::LineTo(x, y) => {
                    let to = device(x, y);
                    if let Some(from) = current {
                        segments.push((from, to));
                    }
                    current = Some(to);
                }
                PathOp::Rect(x, y, w, h) => {
                    let corners = [
                        device(x, y),
                        device(x + w, y),
                        device(x + w, y + h),
                        device(x, y + h),
                    ];
                    for i in 0..4 {
                        segments.push((corners[i], corners[(i + 1) % 4]));
                    }
                    current = Some(corners[0]);
                    start = current;
                }
                PathOp::Close => {
                    if let (Some(from), Some(to)) = (current, start) {
                        segments.push((from, to));
                    }
                    current = start;
                }
                // curves never form table rulings
                _ => {}
            }
        }

        for (from, to) in segments {
            let from = self.to_page(from.0, from.1);
            let to = self.to_page(to.0, to.1);
            if let Some(ruling) = Ruling::between(from, to) {
                if ruling.length() >= MIN_RULING_LENGTH {
                    self.rulings.push(ruling);
                }
            }
        }
    }

    fn build(self) -> PageLayout {
        PageLayout::new(self.number, self.width, self.height, self.glyphs).with_rulings(self.rulings)
    }
}

#[derive(Default)]
struct LayoutSink {
    current: Option<PageBuilder>,
    pages: Vec<PageLayout>,
}

impl LayoutSink {
    fn flush(&mut self) {
        if let Some(page) = self.current.take() {
            self.pages.push(page.build());
        }
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.flush();
        self.pages
    }
}

impl OutputDev for LayoutSink {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> std::result::Result<(), OutputError> {
        self.flush();
        self.current = Some(PageBuilder::new(page_num, media_box));
        Ok(())
    }

    fn end_page(&mut self) -> std::result::Result<(), OutputError> {
        self.flush();
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> std::result::Result<(), OutputError> {
        if let Some(page) = self.current.as_mut() {
            page.push_text(trm, width, font_size, char);
        }
        Ok(())
    }

    fn begin_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> std::result::Result<(), OutputError> {
        Ok(())
    }

    fn stroke(
        &mut self,
        ctm: &Transform,
        _colorspace: &ColorSpace,
        _color: &[f64],
        path: &pdf_extract::Path,
    ) -> std::result::Result<(), OutputError> {
        if let Some(page) = self.current.as_mut() {
            page.push_path(ctm, path);
        }
        Ok(())
    }

    fn fill(
        &mut self,
        ctm: &Transform,
        _colorspace: &ColorSpace,
        _color: &[f64],
        path: &pdf_extract::Path,
    ) -> std::result::Result<(), OutputError> {
        if let Some(page) = self.current.as_mut() {
            page.push_path(ctm, path);
        }
        Ok(())
    }
}
