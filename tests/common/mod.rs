// Shared helpers for integration tests: small real PDFs built with lopdf

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

pub const FONT_SIZE: i64 = 8;
pub const LINE_HEIGHT: f32 = 12.0;
pub const PAGE_TOP: f32 = 760.0;

/// Offset between a printable ASCII character and its glyph id in the
/// embedded CID font
const GLYPH_OFFSET: u32 = 29;

/// `/ToUnicode` map of the CID font: glyphs 3..=97 are U+0020..=U+007E
const TO_UNICODE: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0003> <0061> <0020>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

/// One line of text placed at (x, y) in PDF user space
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

pub fn line(x: f32, y: f32, text: &str) -> TextLine {
    TextLine {
        x,
        y,
        text: text.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Font {
    /// Standard Courier with WinAnsiEncoding
    Courier,
    /// Type0 font with Identity-H encoding; text is only readable through
    /// its `/ToUnicode` map
    Identity,
}

/// One page: text lines plus stroked segments and rectangles (`[x0, y0,
/// x1, y1]` and `[x, y, width, height]`, PDF user space)
pub struct Page {
    pub lines: Vec<TextLine>,
    pub segments: Vec<[f32; 4]>,
    pub frames: Vec<[f32; 4]>,
    pub font: Font,
    /// Show text with `TJ` arrays: words split by kerning adjustments and
    /// separated by positioning offsets instead of space characters
    pub kerned: bool,
}

impl Page {
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn kerned(mut self) -> Self {
        self.kerned = true;
        self
    }
}

impl From<Vec<TextLine>> for Page {
    fn from(lines: Vec<TextLine>) -> Self {
        Page {
            lines,
            segments: Vec::new(),
            frames: Vec::new(),
            font: Font::Courier,
            kerned: false,
        }
    }
}

/// Lines stacked downwards from the top of the page, starting at `x`
pub fn column(x: f32, lines: &[&str]) -> Vec<TextLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| line(x, PAGE_TOP - i as f32 * LINE_HEIGHT, text))
        .collect()
}

/// A three-column page: left, middle and right columns of a Letter page
pub fn three_columns(left: &[&str], middle: &[&str], right: &[&str]) -> Vec<TextLine> {
    let mut lines = column(10.0, left);
    lines.extend(column(210.0, middle));
    lines.extend(column(412.0, right));
    lines
}

/// A fully ruled table. `edges` are the column boundaries; a cell's `\n`
/// wraps it onto further lines and makes its row taller.
pub fn ruled_table(edges: &[f32], rows: &[&[&str]]) -> Page {
    let left = edges[0];
    let right = edges[edges.len() - 1];
    let table_top = PAGE_TOP + LINE_HEIGHT;

    let mut lines = Vec::new();
    let mut segments = Vec::new();
    let mut row_top = table_top;

    for cells in rows {
        let height = cells
            .iter()
            .map(|cell| cell.split('\n').count())
            .max()
            .unwrap_or(1) as f32
            * LINE_HEIGHT
            + 6.0;

        for (x, cell) in edges.iter().zip(cells.iter()) {
            for (i, text) in cell.split('\n').filter(|t| !t.is_empty()).enumerate() {
                lines.push(line(x + 4.0, row_top - 10.0 - i as f32 * LINE_HEIGHT, text));
            }
        }

        segments.push([left, row_top, right, row_top]);
        row_top -= height;
    }
    segments.push([left, row_top, right, row_top]);
    for x in edges {
        segments.push([*x, table_top, *x, row_top]);
    }

    Page {
        lines,
        segments,
        frames: vec![[left, row_top, right - left, table_top - row_top]],
        font: Font::Courier,
        kerned: false,
    }
}

fn number(value: f32) -> Object {
    (value.round() as i64).into()
}

fn show_string(text: &str, font: Font) -> Object {
    match font {
        Font::Courier => Object::string_literal(text),
        Font::Identity => {
            let bytes = text
                .chars()
                .flat_map(|ch| {
                    let gid = (ch as u32).saturating_sub(GLYPH_OFFSET) as u16;
                    gid.to_be_bytes()
                })
                .collect();
            Object::String(bytes, StringFormat::Hexadecimal)
        }
    }
}

/// `TJ` operand for one line: each word split in two by a small kerning
/// pair, words separated by a one-space offset
fn kerned_array(text: &str, font: Font) -> Vec<Object> {
    let mut parts = Vec::new();
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            parts.push((-600).into());
        }
        let chars: Vec<char> = word.chars().collect();
        let (head, tail) = chars.split_at(chars.len() / 2);
        if !head.is_empty() {
            parts.push(show_string(&head.iter().collect::<String>(), font));
            parts.push(15.into());
        }
        parts.push(show_string(&tail.iter().collect::<String>(), font));
    }
    parts
}

fn page_operations(page: &Page) -> Vec<Operation> {
    let mut operations = Vec::new();

    for [x0, y0, x1, y1] in &page.segments {
        operations.push(Operation::new("m", vec![number(*x0), number(*y0)]));
        operations.push(Operation::new("l", vec![number(*x1), number(*y1)]));
        operations.push(Operation::new("S", vec![]));
    }
    for [x, y, width, height] in &page.frames {
        operations.push(Operation::new(
            "re",
            vec![number(*x), number(*y), number(*width), number(*height)],
        ));
        operations.push(Operation::new("S", vec![]));
    }

    let font_name = match page.font {
        Font::Courier => "F1",
        Font::Identity => "F2",
    };
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec![font_name.into(), FONT_SIZE.into()]));
    for text_line in &page.lines {
        operations.push(Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                number(text_line.x),
                number(text_line.y),
            ],
        ));
        if page.kerned {
            operations.push(Operation::new(
                "TJ",
                vec![Object::Array(kerned_array(&text_line.text, page.font))],
            ));
        } else {
            operations.push(Operation::new(
                "Tj",
                vec![show_string(&text_line.text, page.font)],
            ));
        }
    }
    operations.push(Operation::new("ET", vec![]));
    operations
}

fn add_fonts(doc: &mut Document) -> (lopdf::ObjectId, lopdf::ObjectId) {
    let courier_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "Subset+Mono",
        "Flags" => 33,
        "FontBBox" => vec![0.into(), (-200).into(), 600.into(), 800.into()],
        "ItalicAngle" => 0,
        "Ascent" => 800,
        "Descent" => -200,
        "CapHeight" => 700,
        "StemV" => 80,
    });
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "Subset+Mono",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 600,
        "CIDToGIDMap" => "Identity",
    });
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, TO_UNICODE.as_bytes().to_vec()));
    let identity_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "Subset+Mono",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => to_unicode_id,
    });

    (courier_id, identity_id)
}

/// Write a Letter-sized PDF with one page per entry of `pages`, all text
/// at 8pt
pub fn write_pdf(path: &Path, pages: &[Page]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let (courier_id, identity_id) = add_fonts(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => courier_id,
            "F2" => identity_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
