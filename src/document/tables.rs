//! Ruling-based table detection.
//!
//! Tables are found from the lines painted on the page, the way pdfplumber's
//! default "lines" strategy finds them. Rulings are snapped into horizontal
//! and vertical edges; every band between two horizontal edges is a row
//! candidate, cut into cells wherever a vertical edge spans the whole band.
//! A cell's text is every glyph whose centre lies inside it, so a value that
//! wraps onto several visual lines stays one cell. Consecutive rows form a
//! table; a band with no closed cell ends it.

use std::sync::LazyLock;

use regex::Regex;

use super::layout::{BoundingBox, PageLayout, Ruling, Tolerance};

static CID_ARTIFACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(cid:\d+\)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSettings {
    /// Distance (points) within which parallel rulings are one edge and
    /// within which an edge counts as reaching a corner
    pub snap_tolerance: f32,
    pub tolerance: Tolerance,
}

impl Default for TableSettings {
    fn default() -> Self {
        TableSettings {
            snap_tolerance: 3.0,
            tolerance: Tolerance::default(),
        }
    }
}

/// Rows of raw cell text. Rows of one table share its column grid; a
/// position covered by a merged cell is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// Every ruled table on one page, top to bottom. Pages without rulings yield
/// no tables.
pub fn extract_tables(page: &PageLayout, settings: &TableSettings) -> Vec<Table> {
    let snap = settings.snap_tolerance;
    let rulings = page.rulings();
    let horizontal = snap_edges(
        rulings.iter().filter(|r| r.is_horizontal()),
        Axis::Horizontal,
        snap,
    );
    let vertical = snap_edges(
        rulings.iter().filter(|r| r.is_vertical()),
        Axis::Vertical,
        snap,
    );
    if horizontal.len() < 2 || vertical.len() < 2 {
        return Vec::new();
    }

    let mut tables = Vec::new();
    let mut pending: Vec<Vec<BoundingBox>> = Vec::new();

    for band in horizontal.windows(2) {
        let cells = row_cells(&band[0], &band[1], &vertical, snap);
        if cells.is_empty() {
            if !pending.is_empty() {
                tables.push(fill_table(page, &pending, settings));
                pending.clear();
            }
        } else {
            pending.push(cells);
        }
    }
    if !pending.is_empty() {
        tables.push(fill_table(page, &pending, settings));
    }

    tables
}

/// Strip `(cid:N)` artifacts and collapse whitespace.
pub fn clean_cell(text: &str) -> String {
    CID_ARTIFACT
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// EDGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Rulings sharing one position, merged into covered spans
#[derive(Debug, Clone, PartialEq)]
struct Edge {
    position: f32,
    spans: Vec<(f32, f32)>,
}

impl Edge {
    /// Whether the edge runs unbroken from `from` to `to`
    fn covers(&self, from: f32, to: f32, snap: f32) -> bool {
        self.spans
            .iter()
            .any(|(start, end)| *start <= from + snap && *end >= to - snap)
    }
}

fn snap_edges<'a>(rulings: impl Iterator<Item = &'a Ruling>, axis: Axis, snap: f32) -> Vec<Edge> {
    // (position, span start, span end)
    let mut lines: Vec<(f32, f32, f32)> = rulings
        .map(|r| match axis {
            Axis::Horizontal => ((r.top + r.bottom) / 2.0, r.x0, r.x1),
            Axis::Vertical => ((r.x0 + r.x1) / 2.0, r.top, r.bottom),
        })
        .collect();
    lines.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<Vec<(f32, f32, f32)>> = Vec::new();
    for line in lines {
        match groups.last_mut() {
            Some(group) if line.0 - group[0].0 <= snap => group.push(line),
            _ => groups.push(vec![line]),
        }
    }

    groups
        .into_iter()
        .map(|group| {
            let position = group.iter().map(|l| l.0).sum::<f32>() / group.len() as f32;
            let mut spans: Vec<(f32, f32)> = group.iter().map(|l| (l.1, l.2)).collect();
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut merged: Vec<(f32, f32)> = Vec::new();
            for (start, end) in spans {
                match merged.last_mut() {
                    Some((_, last_end)) if start <= *last_end + snap => {
                        *last_end = last_end.max(end)
                    }
                    _ => merged.push((start, end)),
                }
            }
            Edge {
                position,
                spans: merged,
            }
        })
        .collect()
}

/// Closed cells of the band between two horizontal edges, left to right
fn row_cells(top: &Edge, bottom: &Edge, vertical: &[Edge], snap: f32) -> Vec<BoundingBox> {
    let dividers: Vec<f32> = vertical
        .iter()
        .filter(|edge| edge.covers(top.position, bottom.position, snap))
        .map(|edge| edge.position)
        .collect();

    dividers
        .windows(2)
        .filter(|pair| top.covers(pair[0], pair[1], snap) && bottom.covers(pair[0], pair[1], snap))
        .map(|pair| BoundingBox::new(pair[0], top.position, pair[1], bottom.position))
        .collect()
}

// ============================================================================
// CELL TEXT
// ============================================================================

fn fill_table(page: &PageLayout, rows: &[Vec<BoundingBox>], settings: &TableSettings) -> Table {
    let snap = settings.snap_tolerance;

    let mut columns: Vec<f32> = rows
        .iter()
        .flatten()
        .flat_map(|cell| [cell.x0, cell.x1])
        .collect();
    columns.sort_by(|a, b| a.total_cmp(b));
    columns.dedup_by(|b, a| *b - *a <= snap);
    let width = columns.len().saturating_sub(1);

    let rows = rows
        .iter()
        .map(|cells| {
            let mut row = vec![String::new(); width];
            for cell in cells {
                let index = columns
                    .iter()
                    .position(|x| (x - cell.x0).abs() <= snap)
                    .unwrap_or(0)
                    .min(width.saturating_sub(1));
                if let Some(slot) = row.get_mut(index) {
                    *slot = page
                        .crop(*cell)
                        .extract_text(settings.tolerance)
                        .unwrap_or_default();
                }
            }
            row
        })
        .collect();

    Table { rows }
}
