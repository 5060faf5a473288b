//! Document access: page layout, column reading, chunking and tables.

pub mod chunker;
pub mod columns;
pub mod layout;
pub mod pdf;
pub mod tables;

pub use chunker::{ChunkWorkspace, DEFAULT_PAGES_PER_CHUNK};
pub use columns::{ColumnExtractor, ColumnLayout};
pub use layout::{BoundingBox, Glyph, PageLayout, Ruling, Tolerance};
pub use pdf::PdfDocument;
pub use tables::{clean_cell, extract_tables, Table, TableSettings};
