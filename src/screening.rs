// Screening - name and identity-document checks against the registry
//
// Two collaborators sit outside this crate: a reader that pulls the holder
// name out of an identity-document image, and a lookup that finds public
// mentions of a name. Both are best-effort; neither can fail a screening.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity::SanctionedEntity;
use crate::matcher;
use crate::registry::RegistryHandle;

/// Filler run the MRZ reader leaves after the given names
static MRZ_FILLER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+K").unwrap());

/// Keywords that flag a public mention as suspicious
pub const SUSPICIOUS_KEYWORDS: &[&str] = &[
    "sanction",
    "sanctions",
    "sanctioned",
    "terror",
    "terrorism",
    "terrorist",
    "money laundering",
    "laundering",
    "criminal",
    "fraud",
    "fraudulent",
    "illegal",
    "illicit",
    "trafficking",
    "ofac",
    "blacklist",
    "blacklisted",
    "blocked",
    "sdn",
    "violation",
];

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Reads the holder name from an identity-document image
pub trait IdentityDocumentReader: Send + Sync {
    /// `None` when no name could be read, for whatever reason
    fn read(&self, image: &[u8]) -> Option<HolderName>;
}

/// Finds public mentions of a full name
pub trait MentionsLookup: Send + Sync {
    /// Empty when nothing was found or the lookup failed
    fn lookup(&self, full_name: &str) -> Vec<Mention>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderName {
    pub given_names: String,
    pub surname: String,
}

impl HolderName {
    pub fn new(given_names: impl Into<String>, surname: impl Into<String>) -> Self {
        HolderName {
            given_names: given_names.into(),
            surname: surname.into(),
        }
    }

    /// Clean raw MRZ name fields: anything from a whitespace-then-`K`
    /// filler run onwards is dropped from the given names.
    pub fn from_mrz_fields(names: &str, surname: &str) -> Self {
        let given = MRZ_FILLER.split(names).next().unwrap_or("");
        HolderName::new(given.trim(), surname.trim())
    }

    /// "<given names> <surname>"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_names, self.surname)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub link: String,
    pub title: String,
    pub description: String,
    pub suspicious: bool,
}

impl Mention {
    /// Mention flagged by `is_suspicious`
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let description = description.into();
        Mention {
            link: link.into(),
            suspicious: is_suspicious(&title, &description),
            title,
            description,
        }
    }
}

/// True when the title or description mentions any suspicious keyword
pub fn is_suspicious(title: &str, description: &str) -> bool {
    let text = format!("{} {}", title, description).to_lowercase();
    SUSPICIOUS_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

// ============================================================================
// SCREENER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningOutcome {
    /// The name that was screened; `None` if no name could be read
    pub full_name: Option<String>,
    pub matched: Option<SanctionedEntity>,
    /// Mentions of a matched name, when a lookup is configured
    pub mentions: Option<Vec<Mention>>,
}

impl ScreeningOutcome {
    fn unreadable() -> Self {
        ScreeningOutcome {
            full_name: None,
            matched: None,
            mentions: None,
        }
    }

    pub fn match_found(&self) -> bool {
        self.matched.is_some()
    }
}

pub struct Screener {
    registry: RegistryHandle,
    reader: Option<Box<dyn IdentityDocumentReader>>,
    mentions: Option<Box<dyn MentionsLookup>>,
}

impl Screener {
    pub fn new(registry: RegistryHandle) -> Self {
        Screener {
            registry,
            reader: None,
            mentions: None,
        }
    }

    /// Builder pattern: attach an identity-document reader
    pub fn with_reader(mut self, reader: Box<dyn IdentityDocumentReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Builder pattern: attach a public-mentions lookup
    pub fn with_mentions(mut self, mentions: Box<dyn MentionsLookup>) -> Self {
        self.mentions = Some(mentions);
        self
    }

    /// Check `name` against the current registry
    pub fn screen_name(&self, name: &str) -> ScreeningOutcome {
        let registry = self.registry.current();
        let matched = matcher::check(name, &registry).cloned();

        let mentions = match (&matched, &self.mentions) {
            (Some(_), Some(lookup)) => Some(lookup.lookup(name)),
            _ => None,
        };

        info!(matched = matched.is_some(), "Screened name {:?}", name);
        ScreeningOutcome {
            full_name: Some(name.to_string()),
            matched,
            mentions,
        }
    }

    /// Read the holder name from an identity-document image and screen it
    pub fn screen_document(&self, image: &[u8]) -> ScreeningOutcome {
        let holder = self.reader.as_ref().and_then(|reader| reader.read(image));
        match holder {
            Some(holder) => self.screen_name(&holder.full_name()),
            None => {
                debug!("No holder name read from a {} byte document", image.len());
                ScreeningOutcome::unreadable()
            }
        }
    }
}
