// UAE Parser - UAE Local Terrorist List
//
// Format: a table spread over many pages, or a CSV export of the same
// table. Rows from every page are pooled; the entity name sits in a fixed
// column (12 in the published layout). There is no header handling: a
// header row whose name cell is non-empty becomes an entity like any other.

use std::path::Path;

use tracing::{info, warn};

use super::SourceParser;
use crate::document::{clean_cell, extract_tables, PdfDocument, TableSettings};
use crate::entity::{SanctionedEntity, Source};
use crate::error::{Result, SanctionsError};

/// Column holding the entity name in the published layout
pub const DEFAULT_NAME_COLUMN: usize = 12;

pub struct UaeParser {
    name_column: usize,
    settings: TableSettings,
}

impl UaeParser {
    pub fn new(name_column: usize) -> Self {
        UaeParser {
            name_column,
            settings: TableSettings::default(),
        }
    }

    /// Builder pattern: replace table detection settings
    pub fn with_settings(mut self, settings: TableSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Raw rows of every table on every page, in page order
    pub fn read_rows(&self, path: &Path) -> Result<Vec<Vec<String>>> {
        if is_csv(path) {
            return read_csv_rows(path);
        }

        let pages = PdfDocument::open(path)?.layouts()?;
        let rows: Vec<Vec<String>> = pages
            .iter()
            .flat_map(|page| extract_tables(page, &self.settings))
            .flat_map(|table| table.rows)
            .collect();

        info!("Pooled {} table rows from {} pages", rows.len(), pages.len());
        Ok(rows)
    }

    /// Clean every cell, drop rows with no content, read the name column.
    /// A name column beyond the widest row yields nothing.
    pub fn parse_rows(&self, rows: Vec<Vec<String>>) -> Vec<SanctionedEntity> {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.iter().map(|cell| clean_cell(cell)).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        if rows.is_empty() {
            warn!("UAE document contains no table rows");
            return Vec::new();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if self.name_column >= width {
            warn!(
                "Name column {} is out of range for a table with {} columns",
                self.name_column, width
            );
            return Vec::new();
        }

        let entities: Vec<SanctionedEntity> = rows
            .iter()
            .filter_map(|row| row.get(self.name_column))
            .filter(|name| !name.is_empty())
            .map(|name| SanctionedEntity::new(name.clone(), Source::Uae))
            .collect();

        info!(
            "Parsed {} entries from {} rows, dropped {} without a name",
            entities.len(),
            rows.len(),
            rows.len() - entities.len()
        );
        entities
    }
}

impl Default for UaeParser {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_COLUMN)
    }
}

impl SourceParser for UaeParser {
    fn parse(&self, path: &Path) -> Result<Vec<SanctionedEntity>> {
        if !path.exists() {
            info!("UAE document not found: {}", path.display());
            return Ok(Vec::new());
        }

        info!("Processing UAE document {}", path.display());
        let rows = self.read_rows(path)?;
        Ok(self.parse_rows(rows))
    }

    fn source(&self) -> Source {
        Source::Uae
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let csv_error = |source| SanctionsError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    info!("Read {} CSV rows from {}", rows.len(), path.display());
    Ok(rows)
}
