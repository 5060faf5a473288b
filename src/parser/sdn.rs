// SDN Parser - OFAC Specially Designated Nationals list
//
// Format: three-column free text, one entry per designation. Each entry
// ends with its program code(s) in square brackets followed by "].":
//
//   SMITH, John (a.k.a. "JONNY"; a.k.a. SMITH, Jon); DOB 1970; [SDGT].
//
// The document is split into chunk files, read band by band, then cut
// into entries at every "]." that is followed by whitespace and an
// uppercase letter or digit.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use super::{preview, SourceParser, TextParser};
use crate::document::{ChunkWorkspace, ColumnExtractor};
use crate::entity::{Aliases, SanctionedEntity, Source};
use crate::error::{EntryOutcome, Result};

/// Name used when an entry carries no recognisable name prefix
pub const UNKNOWN_NAME: &str = "Unknown";

const ALIAS_MARKER: &str = "(a.k.a.";

static ENTRY_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\.\s[A-Z0-9]").unwrap());
static TERMINAL_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[A-Z0-9\-]+\]$").unwrap());
static PROGRAM_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[A-Z0-9\-]+\]").unwrap());
static NAME_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s").unwrap());
static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static CYRILLIC_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Cyrillic:\s*([^)]+)").unwrap());
static CYRILLIC_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(?Cyrillic:[^)]*\)?").unwrap());

pub struct SdnParser {
    chunk_dir: PathBuf,
    pages_per_chunk: usize,
    extractor: ColumnExtractor,
}

impl SdnParser {
    pub fn new(chunk_dir: impl Into<PathBuf>, pages_per_chunk: usize) -> Self {
        SdnParser {
            chunk_dir: chunk_dir.into(),
            pages_per_chunk: pages_per_chunk.max(1),
            extractor: ColumnExtractor::default(),
        }
    }

    /// Builder pattern: replace the column extractor
    pub fn with_extractor(mut self, extractor: ColumnExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Reading-ordered text of the whole document, extracted chunk by chunk
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        let mut workspace = ChunkWorkspace::new(&self.chunk_dir);
        let chunks = workspace.split(path, self.pages_per_chunk)?;
        if chunks.is_empty() {
            return Ok(String::new());
        }
        self.extractor.extract_documents(&chunks)
    }
}

impl SourceParser for SdnParser {
    fn parse(&self, path: &Path) -> Result<Vec<SanctionedEntity>> {
        info!("Processing SDN document {}", path.display());
        let text = self.extract_text(path)?;
        Ok(self.parse_text(&text))
    }

    fn source(&self) -> Source {
        Source::Sdn
    }
}

impl TextParser for SdnParser {
    fn split_entries(&self, text: &str) -> Vec<String> {
        let mut entries = Vec::new();
        let mut start = 0;

        // the boundary's "]." belongs to neither neighbour; it is restored
        // when the entry is re-terminated
        for boundary in ENTRY_BOUNDARY.find_iter(text) {
            entries.push(text[start..boundary.start()].to_string());
            start = boundary.start() + 2;
        }
        entries.push(text[start..].to_string());

        entries
            .into_iter()
            .map(|entry| entry.trim().to_string())
            .filter(|entry| !entry.is_empty())
            .map(|mut entry| {
                if !entry.ends_with("].") && !TERMINAL_CODE.is_match(&entry) {
                    entry.push_str("].");
                }
                entry
            })
            .collect()
    }

    fn parse_entry(&self, entry: &str) -> EntryOutcome<SanctionedEntity> {
        if !PROGRAM_CODE.is_match(entry) {
            return EntryOutcome::malformed(format!(
                "no bracketed program code: {}",
                preview(entry)
            ));
        }

        let entity = SanctionedEntity::new(extract_name(entry), Source::Sdn).with_aliases(Aliases {
            good_quality: extract_aliases(entry),
            low_quality: Vec::new(),
        });
        EntryOutcome::Parsed(entity)
    }
}

/// Text before the first alias group or the first ", ", whichever is earlier
fn extract_name(entry: &str) -> String {
    let end = [
        entry.find(ALIAS_MARKER),
        NAME_BREAK.find(entry).map(|m| m.start()),
    ]
    .into_iter()
    .flatten()
    .min();

    let name = end.map(|end| entry[..end].trim()).unwrap_or("");
    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Aliases in order of appearance, duplicates collapsed (first kept)
fn extract_aliases(entry: &str) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();
    let mut push = |alias: &str| {
        let alias = alias.trim().trim_matches('"').trim();
        if !alias.is_empty() && !aliases.iter().any(|a| a == alias) {
            aliases.push(alias.to_string());
        }
    };

    for group in alias_groups(entry) {
        for item in group.split(';') {
            let item = item.trim();
            let item = item.strip_prefix("a.k.a.").unwrap_or(item).trim();

            if item.contains("Cyrillic:") {
                if let Some(payload) = CYRILLIC_PAYLOAD.captures(item).and_then(|c| c.get(1)) {
                    push(payload.as_str());
                }
                push(CYRILLIC_TAG.replace_all(item, "").as_ref());
            } else {
                push(item);
            }
        }
    }

    for quoted in QUOTED.captures_iter(entry).filter_map(|c| c.get(1)) {
        push(quoted.as_str());
    }

    aliases
}

/// Contents of every "(a.k.a. ...)" group, honouring nested parentheses.
/// An unclosed group runs to the end of the entry.
fn alias_groups(entry: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = entry;

    while let Some(at) = rest.find(ALIAS_MARKER) {
        let body = &rest[at + ALIAS_MARKER.len()..];
        let mut depth = 1usize;
        let mut close = None;

        for (i, ch) in body.char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }

        match close {
            Some(i) => {
                groups.push(&body[..i]);
                rest = &body[i + 1..];
            }
            None => {
                groups.push(body);
                break;
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SdnParser {
        SdnParser::new("unused_chunks", 20)
    }

    #[test]
    fn test_parse_entry_with_quoted_and_plain_aliases() {
        let entities =
            parser().parse_text(r#"JOHN SMITH (a.k.a. "JONNY SMITH"; a.k.a. JON SMITH) [SDGT]."#);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "JOHN SMITH");
        assert_eq!(entities[0].source, Source::Sdn);
        assert_eq!(
            entities[0].aliases.good_quality,
            vec!["JONNY SMITH", "JON SMITH"]
        );
        assert!(entities[0].aliases.low_quality.is_empty());
    }

    #[test]
    fn test_entry_without_program_code_is_excluded() {
        let text = "ACME TRADING, Dubai [SDGT]. LOOSE TEXT WITHOUT A CODE";
        let entities = parser().parse_text(text);

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "ACME TRADING");
    }

    #[test]
    fn test_split_restores_terminator() {
        let entries = parser().split_entries("ALPHA, x [SDGT]. BETA, y [IRAN]. 7TH CORP, z [SYRIA].");
        assert_eq!(
            entries,
            vec!["ALPHA, x [SDGT].", "BETA, y [IRAN].", "7TH CORP, z [SYRIA]."]
        );
    }

    #[test]
    fn test_boundary_needs_uppercase_or_digit() {
        // "]. and" is not a boundary
        let entries = parser().split_entries("ALPHA, see [SDGT]. and more [IRAN].");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_ten_valid_and_one_malformed() {
        let mut text = String::new();
        for i in 0..10 {
            text.push_str(&format!("PERSON {}, Kabul [SDGT]. ", i));
        }
        text.push_str("TRAILING FOOTER NOTE");

        let entities = parser().parse_text(&text);
        assert_eq!(entities.len(), 10);
        assert_eq!(entities[9].name, "PERSON 9");
    }

    #[test]
    fn test_name_falls_back_to_unknown() {
        let entities = parser().parse_text("ACME CORPORATION [SDGT].");
        assert_eq!(entities[0].name, UNKNOWN_NAME);
    }

    #[test]
    fn test_name_stops_at_first_comma() {
        let entities = parser().parse_text("SMITH, John (a.k.a. SMYTH, Jon); DOB 1970; [SDGT].");
        assert_eq!(entities[0].name, "SMITH");
        assert_eq!(entities[0].aliases.good_quality, vec!["SMYTH, Jon"]);
    }

    #[test]
    fn test_cyrillic_alias_payload_comes_first() {
        let entry = "IVANOV, Ivan (a.k.a. IVANOFF, Ivan (Cyrillic: ИВАНОВ, Иван)) [RUSSIA-EO14024].";
        let entities = parser().parse_text(entry);

        assert_eq!(
            entities[0].aliases.good_quality,
            vec!["ИВАНОВ, Иван", "IVANOFF, Ivan"]
        );
    }

    #[test]
    fn test_duplicate_aliases_collapse() {
        let entry = r#"BANK X (a.k.a. "BX"; a.k.a. BX; a.k.a. "BANK-X") [IRAN]."#;
        let entities = parser().parse_text(entry);
        assert_eq!(entities[0].aliases.good_quality, vec!["BX", "BANK-X"]);
    }

    #[test]
    fn test_unclosed_alias_group_runs_to_end() {
        let groups = alias_groups("NAME (a.k.a. ONE; a.k.a. TWO [SDGT].");
        assert_eq!(groups, vec![" ONE; a.k.a. TWO [SDGT]."]);
    }

    #[test]
    fn test_missing_document_yields_no_entities() {
        let tmp = tempfile::tempdir().unwrap();
        let parser = SdnParser::new(tmp.path().join("chunks"), 20);
        let entities = parser.parse(&tmp.path().join("sdnlist.pdf")).unwrap();
        assert!(entities.is_empty());
    }
}
