// Parser Framework - one strategy per sanctions list dialect
//
// The assembler only sees `SourceParser`; everything source-specific lives
// in the three implementations below.

use std::path::Path;

use tracing::{debug, info};

use crate::config::Config;
use crate::entity::{SanctionedEntity, Source};
use crate::error::{EntryOutcome, Result};

pub mod sdn;
pub mod uae;
pub mod un;

pub use sdn::SdnParser;
pub use uae::UaeParser;
pub use un::UnParser;

// ============================================================================
// COMPOSABLE TRAITS
// ============================================================================

/// SourceParser - Core trait (minimal, required)
///
/// A parser turns one source document into entities. Malformed entries are
/// dropped inside the parser; an `Err` means the document as a whole could
/// not be read.
pub trait SourceParser: Send + Sync {
    /// Parse the document at `path`
    fn parse(&self, path: &Path) -> Result<Vec<SanctionedEntity>>;

    /// The list this parser reads
    fn source(&self) -> Source;

    /// Parser version (for provenance in logs)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// TextParser - Optional capability: parse already-extracted text
///
/// Free-text dialects implement this so their entry logic can run without a
/// PDF in hand.
pub trait TextParser {
    /// Split extracted text into raw entries
    fn split_entries(&self, text: &str) -> Vec<String>;

    /// Validate and parse a single raw entry
    fn parse_entry(&self, entry: &str) -> EntryOutcome<SanctionedEntity>;

    /// Split, parse, and keep every entry that validates
    fn parse_text(&self, text: &str) -> Vec<SanctionedEntity>
    where
        Self: SourceParser,
    {
        let outcomes = self
            .split_entries(text)
            .into_iter()
            .map(|entry| self.parse_entry(&entry));
        collect_outcomes(self.source(), outcomes)
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Get the parser for a source, configured from `config`
pub fn get_parser(source: Source, config: &Config) -> Box<dyn SourceParser> {
    match source {
        Source::Sdn => Box::new(SdnParser::new(
            config.ingest.chunk_dir.clone(),
            config.ingest.pages_per_chunk,
        )),
        Source::Un => Box::new(UnParser::new()),
        Source::Uae => Box::new(UaeParser::new(config.ingest.uae_name_column)),
    }
}

/// Keep parsed entities, log and drop the rest
pub(crate) fn collect_outcomes<I>(source: Source, outcomes: I) -> Vec<SanctionedEntity>
where
    I: IntoIterator<Item = EntryOutcome<SanctionedEntity>>,
{
    let mut entities = Vec::new();
    let mut dropped = 0usize;

    for outcome in outcomes {
        match outcome {
            EntryOutcome::Parsed(entity) if entity.is_valid() => entities.push(entity),
            EntryOutcome::Parsed(entity) => {
                dropped += 1;
                debug!(%source, "Dropped entry with blank name: {:?}", entity.id);
            }
            EntryOutcome::Malformed(reason) => {
                dropped += 1;
                debug!(%source, "Dropped malformed entry: {}", reason);
            }
        }
    }

    info!(
        %source,
        "Parsed {} entries, dropped {} malformed",
        entities.len(),
        dropped
    );
    entities
}

/// First characters of an entry, for diagnostics
pub(crate) fn preview(entry: &str) -> String {
    const PREVIEW_CHARS: usize = 60;
    let mut text: String = entry.chars().take(PREVIEW_CHARS).collect();
    if entry.chars().count() > PREVIEW_CHARS {
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_matching_parser() {
        let config = Config::default();
        for source in Source::ALL {
            assert_eq!(get_parser(source, &config).source(), source);
        }
    }

    #[test]
    fn test_collect_outcomes_drops_malformed_and_blank() {
        let outcomes = vec![
            EntryOutcome::Parsed(SanctionedEntity::new("A", Source::Un)),
            EntryOutcome::malformed("no identifier"),
            EntryOutcome::Parsed(SanctionedEntity::new(" ", Source::Un)),
            EntryOutcome::Parsed(SanctionedEntity::new("B", Source::Un)),
        ];

        let entities = collect_outcomes(Source::Un, outcomes);
        let names: Vec<&str> = entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "Ж".repeat(100);
        let short = preview(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 63);
        assert_eq!(preview("short"), "short");
    }
}
