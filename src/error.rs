// Error taxonomy for ingestion, persistence and reprocessing
//
// Entry-level problems never become a SanctionsError: they are reported as
// EntryOutcome::Malformed and dropped by the parser that saw them.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SanctionsError>;

#[derive(Debug, Error)]
pub enum SanctionsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read PDF {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("failed to extract page contents of {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("failed to write chunk {path}: {message}")]
    ChunkWrite { path: PathBuf, message: String },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("snapshot database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot {id} failed checksum verification")]
    ChecksumMismatch { id: String },

    #[error("snapshot {id} has format version {found}, newest supported is {supported}")]
    UnsupportedFormat { id: String, found: u32, supported: u32 },

    #[error("a reprocess run is already in progress")]
    ReprocessInProgress,
}

impl SanctionsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SanctionsError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn pdf(path: impl Into<PathBuf>, source: lopdf::Error) -> Self {
        SanctionsError::Pdf {
            path: path.into(),
            source,
        }
    }

    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SanctionsError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of parsing one delimited entry of a source document.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome<T> {
    /// The entry passed validation
    Parsed(T),
    /// The entry failed validation; skip it and keep going
    Malformed(String),
}

impl<T> EntryOutcome<T> {
    pub fn malformed(reason: impl Into<String>) -> Self {
        EntryOutcome::Malformed(reason.into())
    }

    pub fn parsed(self) -> Option<T> {
        match self {
            EntryOutcome::Parsed(value) => Some(value),
            EntryOutcome::Malformed(_) => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, EntryOutcome::Parsed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_outcome_accessors() {
        let ok: EntryOutcome<u32> = EntryOutcome::Parsed(7);
        assert!(ok.is_parsed());
        assert_eq!(ok.parsed(), Some(7));

        let bad: EntryOutcome<u32> = EntryOutcome::malformed("no name field");
        assert!(!bad.is_parsed());
        assert_eq!(bad, EntryOutcome::Malformed("no name field".to_string()));
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = SanctionsError::io(
            "/tmp/chunks",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/chunks"));

        let err = SanctionsError::UnsupportedFormat {
            id: "abc".to_string(),
            found: 9,
            supported: 1,
        };
        assert!(err.to_string().contains("format version 9"));
    }
}
