//! Positioned glyphs on a page and the text that can be read back from them.
//!
//! Coordinates use a top-left origin (`top` grows downwards), so sorting by
//! `top` then `x0` gives reading order within a single column.

/// Default horizontal gap (points) above which a space is inserted.
pub const DEFAULT_X_TOLERANCE: f32 = 2.0;

/// Default vertical distance (points) within which glyphs share a line.
pub const DEFAULT_Y_TOLERANCE: f32 = 2.0;

/// A single character placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Glyph {
    pub fn new(ch: char, x0: f32, top: f32, width: f32, height: f32) -> Self {
        Glyph {
            ch,
            x0,
            x1: x0 + width,
            top,
            bottom: top + height,
        }
    }

    pub fn mid_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Axis-aligned region of a page, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        BoundingBox { x0, top, x1, bottom }
    }

    /// A glyph belongs to the box when its centre does. Glyph widths are
    /// estimates, so edge tests would drop characters at band borders.
    pub fn contains(&self, glyph: &Glyph) -> bool {
        let (x, y) = (glyph.mid_x(), glyph.mid_y());
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }
}

/// A straight horizontal or vertical line painted on a page, normalized so
/// that `x0 <= x1` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

/// Slack (points) within which a segment still counts as axis-aligned.
const AXIS_SLACK: f32 = 1.0;

impl Ruling {
    /// The segment from `a` to `b`, or `None` when it is diagonal.
    pub fn between(a: (f32, f32), b: (f32, f32)) -> Option<Ruling> {
        let ruling = Ruling {
            x0: a.0.min(b.0),
            top: a.1.min(b.1),
            x1: a.0.max(b.0),
            bottom: a.1.max(b.1),
        };
        if ruling.is_horizontal() || ruling.is_vertical() {
            Some(ruling)
        } else {
            None
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.bottom - self.top <= AXIS_SLACK
    }

    pub fn is_vertical(&self) -> bool {
        self.x1 - self.x0 <= AXIS_SLACK && !self.is_horizontal()
    }

    pub fn length(&self) -> f32 {
        (self.x1 - self.x0).max(self.bottom - self.top)
    }
}

/// Text tolerances used when glyphs are grouped back into lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub x: f32,
    pub y: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            x: DEFAULT_X_TOLERANCE,
            y: DEFAULT_Y_TOLERANCE,
        }
    }
}

/// All glyphs and rulings of one page plus its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub number: u32,
    pub width: f32,
    pub height: f32,
    glyphs: Vec<Glyph>,
    rulings: Vec<Ruling>,
}

impl PageLayout {
    pub fn new(number: u32, width: f32, height: f32, glyphs: Vec<Glyph>) -> Self {
        PageLayout {
            number,
            width,
            height,
            glyphs,
            rulings: Vec::new(),
        }
    }

    /// Builder pattern: attach the page's painted rulings
    pub fn with_rulings(mut self, rulings: Vec<Ruling>) -> Self {
        self.rulings = rulings;
        self
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn rulings(&self) -> &[Ruling] {
        &self.rulings
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.iter().all(|g| g.ch.is_whitespace())
    }

    /// A view of the page holding only the glyphs inside `bbox`. Rulings are
    /// not carried over.
    pub fn crop(&self, bbox: BoundingBox) -> PageLayout {
        let glyphs = self
            .glyphs
            .iter()
            .filter(|g| bbox.contains(g))
            .cloned()
            .collect();
        PageLayout::new(self.number, self.width, self.height, glyphs)
    }

    /// Glyphs grouped into lines, top to bottom, each sorted left to right.
    pub fn lines(&self, y_tolerance: f32) -> Vec<Vec<&Glyph>> {
        let mut sorted: Vec<&Glyph> = self.glyphs.iter().collect();
        sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

        let mut lines: Vec<Vec<&Glyph>> = Vec::new();
        let mut line_top = f32::NEG_INFINITY;
        for glyph in sorted {
            match lines.last_mut() {
                Some(line) if (glyph.top - line_top).abs() <= y_tolerance => line.push(glyph),
                _ => {
                    line_top = glyph.top;
                    lines.push(vec![glyph]);
                }
            }
        }

        for line in &mut lines {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        }
        lines
    }

    /// Page text with one output line per visual line. `None` when the page
    /// (or cropped region) carries no visible characters.
    pub fn extract_text(&self, tolerance: Tolerance) -> Option<String> {
        let text = self
            .lines(tolerance.y)
            .iter()
            .map(|line| join_glyphs(line, tolerance.x))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Concatenate one line's glyphs, inserting a space wherever the horizontal
/// gap exceeds `x_tolerance` and the text does not already carry one.
pub(crate) fn join_glyphs(glyphs: &[&Glyph], x_tolerance: f32) -> String {
    let mut text = String::new();
    let mut previous: Option<&Glyph> = None;

    for glyph in glyphs {
        if let Some(prev) = previous {
            let gap = glyph.x0 - prev.x1;
            if gap > x_tolerance && !prev.ch.is_whitespace() && !glyph.ch.is_whitespace() {
                text.push(' ');
            }
        }
        text.push(glyph.ch);
        previous = Some(glyph);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lay out `text` as monospaced glyphs starting at (`x`, `top`).
#[cfg(test)]
pub(crate) fn glyph_run(text: &str, x: f32, top: f32, advance: f32) -> Vec<Glyph> {
    text.chars()
        .enumerate()
        .map(|(i, ch)| Glyph::new(ch, x + i as f32 * advance, top, advance, 10.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_group_by_top_and_sort_by_x() {
        let mut glyphs = glyph_run("WORLD", 100.0, 50.5, 6.0);
        glyphs.extend(glyph_run("HELLO", 10.0, 50.0, 6.0));
        glyphs.extend(glyph_run("NEXT", 10.0, 70.0, 6.0));
        let page = PageLayout::new(1, 600.0, 800.0, glyphs);

        let text = page.extract_text(Tolerance::default()).unwrap();
        assert_eq!(text, "HELLO WORLD\nNEXT");
    }

    #[test]
    fn test_small_gaps_do_not_split_words() {
        let mut glyphs = glyph_run("AB", 10.0, 10.0, 6.0);
        glyphs.extend(glyph_run("CD", 23.5, 10.0, 6.0));
        let page = PageLayout::new(1, 600.0, 800.0, glyphs);

        assert_eq!(page.extract_text(Tolerance::default()).unwrap(), "ABCD");
    }

    #[test]
    fn test_crop_keeps_glyphs_by_centre() {
        let mut glyphs = glyph_run("LEFT", 10.0, 10.0, 6.0);
        glyphs.extend(glyph_run("RIGHT", 300.0, 10.0, 6.0));
        let page = PageLayout::new(1, 600.0, 800.0, glyphs);

        let left = page.crop(BoundingBox::new(0.0, 0.0, 200.0, 800.0));
        assert_eq!(left.extract_text(Tolerance::default()).unwrap(), "LEFT");

        let empty = page.crop(BoundingBox::new(200.0, 0.0, 250.0, 800.0));
        assert!(empty.is_empty());
        assert_eq!(empty.extract_text(Tolerance::default()), None);
    }

    #[test]
    fn test_ruling_orientation() {
        let horizontal = Ruling::between((200.0, 50.0), (10.0, 50.4)).unwrap();
        assert!(horizontal.is_horizontal());
        assert_eq!((horizontal.x0, horizontal.x1), (10.0, 200.0));
        assert_eq!(horizontal.length(), 190.0);

        let vertical = Ruling::between((10.0, 90.0), (10.0, 50.0)).unwrap();
        assert!(vertical.is_vertical());
        assert_eq!((vertical.top, vertical.bottom), (50.0, 90.0));

        assert!(Ruling::between((0.0, 0.0), (40.0, 30.0)).is_none());
    }

    #[test]
    fn test_whitespace_only_page_has_no_text() {
        let page = PageLayout::new(1, 600.0, 800.0, glyph_run("   ", 10.0, 10.0, 6.0));
        assert_eq!(page.extract_text(Tolerance::default()), None);
    }
}
