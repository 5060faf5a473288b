//! Splits large PDFs into fixed-size chunk files inside a working directory.
//!
//! A `ChunkWorkspace` owns every file it writes. Dropping it removes them,
//! then removes the directory if nothing else is left in it; a non-empty
//! directory is left in place with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::pdf::PdfDocument;
use crate::error::{Result, SanctionsError};

pub const DEFAULT_PAGES_PER_CHUNK: usize = 20;

#[derive(Debug)]
pub struct ChunkWorkspace {
    dir: PathBuf,
    files: Vec<PathBuf>,
    touched: bool,
}

impl ChunkWorkspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ChunkWorkspace {
            dir: dir.into(),
            files: Vec::new(),
            touched: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Chunk files written so far, in page order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Write `source` as consecutive chunks of `pages_per_chunk` pages.
    ///
    /// A missing or page-less document yields no chunks. On error, chunks
    /// already written stay registered and are removed on drop.
    pub fn split(&mut self, source: &Path, pages_per_chunk: usize) -> Result<Vec<PathBuf>> {
        if !source.exists() {
            warn!("Document not found for splitting: {}", source.display());
            return Ok(Vec::new());
        }

        let document = PdfDocument::open(source)?;
        let pages = document.page_numbers();
        if pages.is_empty() {
            info!("{} has no pages", source.display());
            return Ok(Vec::new());
        }

        self.touched = true;
        fs::create_dir_all(&self.dir).map_err(|e| SanctionsError::io(&self.dir, e))?;

        let pages_per_chunk = pages_per_chunk.max(1);
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");

        info!(
            "Splitting {} ({} pages) into chunks of {} pages in {}",
            source.display(),
            pages.len(),
            pages_per_chunk,
            self.dir.display()
        );

        let mut written = Vec::new();
        for (index, keep) in pages.chunks(pages_per_chunk).enumerate() {
            let path = self
                .dir
                .join(format!("{}_temp_chunk_{:03}.pdf", stem, index + 1));

            let start = index * pages_per_chunk;
            let dropped = pages_outside(&pages, start, start + keep.len());

            let mut chunk = document.inner().clone();
            chunk.delete_pages(&dropped);
            chunk.prune_objects();

            self.files.push(path.clone());
            chunk.save(&path).map_err(|e| SanctionsError::ChunkWrite {
                path: path.clone(),
                message: e.to_string(),
            })?;
            written.push(path);
        }

        info!("Splitting complete: {} chunks", written.len());
        Ok(written)
    }

    fn cleanup(&mut self) {
        for file in self.files.drain(..) {
            if file.exists() {
                if let Err(e) = fs::remove_file(&file) {
                    warn!("Could not remove chunk {}: {}", file.display(), e);
                }
            }
        }

        if !self.touched || !self.dir.exists() {
            return;
        }

        match fs::read_dir(&self.dir) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    if let Err(e) = fs::remove_dir(&self.dir) {
                        warn!("Could not remove chunk directory {}: {}", self.dir.display(), e);
                    }
                } else {
                    warn!(
                        "Chunk directory {} is not empty, leaving it in place",
                        self.dir.display()
                    );
                }
            }
            Err(e) => warn!("Could not inspect chunk directory {}: {}", self.dir.display(), e),
        }
    }
}

/// Every page before `start` and from `end` on
fn pages_outside(pages: &[u32], start: usize, end: usize) -> Vec<u32> {
    pages[..start].iter().chain(&pages[end..]).copied().collect()
}

impl Drop for ChunkWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
