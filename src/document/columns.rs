//! Three-band column extraction for free-text, multi-column list documents.

use std::path::Path;

use tracing::{info, warn};

use super::layout::{BoundingBox, PageLayout, Tolerance};
use super::pdf::PdfDocument;
use crate::error::Result;

/// Geometry of the three vertical bands a page is read in.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    /// Shift of the right-hand band's left edge, avoiding the trailing gutter
    pub right_margin: f32,
    pub tolerance: Tolerance,
    /// Boilerplate token stripped from the very first page's first band
    pub boilerplate_marker: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            right_margin: 40.0,
            tolerance: Tolerance::default(),
            boilerplate_marker: "List.".to_string(),
        }
    }
}

impl ColumnLayout {
    /// Left, middle and right band of a `width` x `height` page.
    pub fn bands(&self, width: f32, height: f32) -> [BoundingBox; 3] {
        let col_width = width / 3.0;
        [
            BoundingBox::new(0.0, 0.0, col_width, height),
            BoundingBox::new(col_width, 0.0, 2.0 * col_width, height),
            BoundingBox::new(width - (col_width + self.right_margin), 0.0, width, height),
        ]
    }

    /// Read one page band by band, left to right. Line breaks inside a band
    /// become spaces; empty bands contribute nothing.
    pub fn extract_page(&self, page: &PageLayout, strip_boilerplate: bool) -> String {
        let mut parts: Vec<String> = self
            .bands(page.width, page.height)
            .iter()
            .filter_map(|band| page.crop(*band).extract_text(self.tolerance))
            .map(|text| text.lines().collect::<Vec<_>>().join(" "))
            .collect();

        if strip_boilerplate {
            if let Some(first) = parts.first_mut() {
                if let Some(stripped) = self.strip_marker(first) {
                    *first = stripped;
                }
            }
        }

        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn strip_marker(&self, text: &str) -> Option<String> {
        let marker = self.boilerplate_marker.as_str();
        if marker.is_empty() || !text.trim_start().starts_with(marker) {
            return None;
        }
        let at = text.find(marker)?;
        Some(text[at + marker.len()..].trim().to_string())
    }
}

/// Reads a sequence of documents (typically the chunks of one source) into a
/// single reading-ordered string.
#[derive(Debug, Clone, Default)]
pub struct ColumnExtractor {
    layout: ColumnLayout,
}

impl ColumnExtractor {
    pub fn new(layout: ColumnLayout) -> Self {
        ColumnExtractor { layout }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Page texts of every document in order, joined by single spaces. Only
    /// the first page of the first document is checked for boilerplate.
    pub fn extract_documents<P: AsRef<Path>>(&self, documents: &[P]) -> Result<String> {
        let mut pages = Vec::new();
        let total = documents.len();

        for (index, path) in documents.iter().enumerate() {
            let path = path.as_ref();
            let layouts = PdfDocument::open(path)?.layouts()?;
            let before = pages.len();
            self.extract_into(&layouts, index == 0, &mut pages);

            if pages.len() == before {
                warn!("No text extracted from {}", path.display());
            }
            info!("Extracted chunk {}/{} ({} pages)", index + 1, total, layouts.len());
        }

        Ok(pages.join(" "))
    }

    /// Append the non-empty text of each page to `out`.
    pub fn extract_into(&self, pages: &[PageLayout], first_document: bool, out: &mut Vec<String>) {
        for (i, page) in pages.iter().enumerate() {
            let text = self.layout.extract_page(page, first_document && i == 0);
            if !text.is_empty() {
                out.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::glyph_run;

    fn three_column_page(left: &[&str], middle: &[&str], right: &[&str]) -> PageLayout {
        let mut glyphs = Vec::new();
        for (x, lines) in [(10.0, left), (210.0, middle), (410.0, right)] {
            for (row, line) in lines.iter().enumerate() {
                glyphs.extend(glyph_run(line, x, 20.0 + row as f32 * 14.0, 5.0));
            }
        }
        PageLayout::new(1, 600.0, 800.0, glyphs)
    }

    #[test]
    fn test_bands_follow_page_width() {
        let bands = ColumnLayout::default().bands(600.0, 800.0);
        assert_eq!(bands[0], BoundingBox::new(0.0, 0.0, 200.0, 800.0));
        assert_eq!(bands[1], BoundingBox::new(200.0, 0.0, 400.0, 800.0));
        assert_eq!(bands[2], BoundingBox::new(360.0, 0.0, 600.0, 800.0));
    }

    #[test]
    fn test_bands_read_left_to_right_with_flattened_lines() {
        let page = three_column_page(&["ALPHA", "BETA"], &["GAMMA"], &["DELTA", "EPSILON"]);
        let text = ColumnLayout::default().extract_page(&page, false);
        assert_eq!(text, "ALPHA BETA GAMMA DELTA EPSILON");
    }

    #[test]
    fn test_empty_band_contributes_nothing() {
        let page = three_column_page(&["ALPHA"], &[], &["DELTA"]);
        let text = ColumnLayout::default().extract_page(&page, false);
        assert_eq!(text, "ALPHA DELTA");
    }

    #[test]
    fn test_boilerplate_marker_stripped_only_when_requested() {
        let page = three_column_page(&["List. JOHN", "SMITH"], &["X"], &[]);
        let layout = ColumnLayout::default();

        assert_eq!(layout.extract_page(&page, true), "JOHN SMITH X");
        assert_eq!(layout.extract_page(&page, false), "List. JOHN SMITH X");
    }

    #[test]
    fn test_marker_in_middle_of_band_is_kept() {
        let page = three_column_page(&["SEE List. BELOW"], &[], &[]);
        assert_eq!(
            ColumnLayout::default().extract_page(&page, true),
            "SEE List. BELOW"
        );
    }

    #[test]
    fn test_only_first_page_of_first_document_is_stripped() {
        let extractor = ColumnExtractor::default();
        let first = three_column_page(&["List. A"], &[], &[]);
        let second = three_column_page(&["List. B"], &[], &[]);

        let mut out = Vec::new();
        extractor.extract_into(&[first.clone(), second.clone()], true, &mut out);
        assert_eq!(out, vec!["A", "List. B"]);

        out.clear();
        extractor.extract_into(&[first], false, &mut out);
        assert_eq!(out, vec!["List. A"]);
    }
}
