// UN Parser - UN Security Council Consolidated List
//
// Format: labelled fields, one entry per reference number
// (two uppercase letters, one lowercase letter, ".", digits):
//
//   TAi.155 Name: 1: ABDUL 2: QADEER 3: BASIR 4: NA
//   Title: a) General b) Maulavi Designation: Military Attaché
//   DOB: 1964 Good quality a.k.a.: a) Abdul Qadir ...
//
// A field's value runs to the end of its line or to the next known label,
// whichever comes first.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use super::{preview, SourceParser, TextParser};
use crate::document::{PdfDocument, Tolerance};
use crate::entity::{Aliases, SanctionedEntity, Source};
use crate::error::{EntryOutcome, Result};

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{2}[a-z]\.\d+").unwrap());
static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(name \(original script\)|name|title|designation|dob|pob|good quality a\.k\.a\.|low quality a\.k\.a\.|nationality|passport no|national identification no|address|listed on|other information):",
    )
    .unwrap()
});
static NAME_SLOTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^1:\s*(.*?)\s+2:\s*(.*?)\s+3:\s*(.*?)\s+4:\s*(.*?)$").unwrap()
});
static LETTERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-z]\)\s*").unwrap());

/// Placeholder the list uses for an unused name slot
const NOT_APPLICABLE: &str = "NA";

/// One labelled field of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    OriginalName,
    Title,
    Designation,
    DateOfBirth,
    Nationality,
    PassportNumber,
    NationalId,
    GoodQualityAka,
    LowQualityAka,
    /// Recognised so it bounds its neighbours, otherwise ignored
    Other,
}

impl Field {
    fn from_label(label: &str) -> Field {
        match label.to_ascii_lowercase().as_str() {
            "name" => Field::Name,
            "name (original script)" => Field::OriginalName,
            "title" => Field::Title,
            "designation" => Field::Designation,
            "dob" => Field::DateOfBirth,
            "nationality" => Field::Nationality,
            "passport no" => Field::PassportNumber,
            "national identification no" => Field::NationalId,
            "good quality a.k.a." => Field::GoodQualityAka,
            "low quality a.k.a." => Field::LowQualityAka,
            _ => Field::Other,
        }
    }
}

pub struct UnParser {
    tolerance: Tolerance,
}

impl UnParser {
    pub fn new() -> Self {
        UnParser {
            tolerance: Tolerance::default(),
        }
    }

    /// Plain page text, pages joined by newlines
    pub fn extract_text(&self, path: &Path) -> Result<String> {
        let pages = PdfDocument::open(path)?.layouts()?;
        info!("Read {} pages from {}", pages.len(), path.display());

        Ok(pages
            .iter()
            .filter_map(|page| page.extract_text(self.tolerance))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl Default for UnParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for UnParser {
    fn parse(&self, path: &Path) -> Result<Vec<SanctionedEntity>> {
        if !path.exists() {
            info!("UN document not found: {}", path.display());
            return Ok(Vec::new());
        }

        info!("Processing UN document {}", path.display());
        let text = self.extract_text(path)?;
        Ok(self.parse_text(&text))
    }

    fn source(&self) -> Source {
        Source::Un
    }
}

impl TextParser for UnParser {
    /// Cut immediately before every reference number. Text ahead of the
    /// first reference is a preamble and is discarded.
    fn split_entries(&self, text: &str) -> Vec<String> {
        let starts: Vec<usize> = REFERENCE.find_iter(text).map(|m| m.start()).collect();

        if let Some(&first) = starts.first() {
            if !text[..first].trim().is_empty() {
                debug!("Skipping preamble: {}", preview(&text[..first]));
            }
        }

        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                text[start..end].trim().to_string()
            })
            .collect()
    }

    fn parse_entry(&self, entry: &str) -> EntryOutcome<SanctionedEntity> {
        let reference = match REFERENCE.find(entry) {
            Some(m) if m.start() == 0 => m.as_str().to_string(),
            _ => {
                return EntryOutcome::malformed(format!(
                    "entry does not start with a reference number: {}",
                    preview(entry)
                ))
            }
        };

        let fields = labelled_fields(entry);

        let name_value = match fields.iter().find(|(field, _)| *field == Field::Name) {
            Some((_, value)) => *value,
            None => {
                return EntryOutcome::malformed(format!("{}: no name field", reference));
            }
        };
        let name = match assemble_name(name_value) {
            Some(name) => name,
            None => {
                return EntryOutcome::malformed(format!(
                    "{}: unstructured name field {:?}",
                    reference, name_value
                ));
            }
        };

        let mut entity = SanctionedEntity::new(name, Source::Un).with_id(reference);
        let mut aliases = Aliases::default();

        for (field, value) in fields {
            let scalar = || Some(value.to_string()).filter(|v| !v.is_empty());
            match field {
                Field::OriginalName => entity.original_name = scalar(),
                Field::Title => entity.title = scalar(),
                Field::Designation => entity.designation = lettered_items(value),
                Field::DateOfBirth => entity.date_of_birth = scalar(),
                Field::Nationality => entity.nationality = scalar(),
                Field::PassportNumber => entity.passport_number = scalar(),
                Field::NationalId => entity.national_id = scalar(),
                Field::GoodQualityAka => aliases.good_quality = lettered_items(value),
                Field::LowQualityAka => aliases.low_quality = lettered_items(value),
                Field::Name | Field::Other => {}
            }
        }

        EntryOutcome::Parsed(entity.with_aliases(aliases))
    }
}

/// Every labelled field in order, with its trimmed value. Repeated labels
/// keep their last occurrence when applied in order.
fn labelled_fields(entry: &str) -> Vec<(Field, &str)> {
    let labels: Vec<(Field, usize, usize)> = LABEL
        .captures_iter(entry)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let label = caps.get(1)?;
            Some((Field::from_label(label.as_str()), whole.start(), whole.end()))
        })
        .collect();

    labels
        .iter()
        .enumerate()
        .map(|(i, &(field, _, value_start))| {
            let next_label = labels.get(i + 1).map(|l| l.1).unwrap_or(entry.len());
            let line_end = entry[value_start..]
                .find('\n')
                .map(|offset| value_start + offset)
                .unwrap_or(entry.len());
            let end = next_label.min(line_end);
            (field, entry[value_start..end].trim())
        })
        .collect()
}

/// Join the four name slots, skipping empty and "NA" slots
fn assemble_name(value: &str) -> Option<String> {
    let caps = NAME_SLOTS.captures(value)?;
    let parts: Vec<&str> = (1..=4)
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str().trim())
        .filter(|part| !part.is_empty() && !part.eq_ignore_ascii_case(NOT_APPLICABLE))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Split "a) X b) Y" into ["X", "Y"]; unlettered values become one item
fn lettered_items(value: &str) -> Vec<String> {
    LETTERED
        .split(value)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
