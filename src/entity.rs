// Sanctioned entity records - the common schema every source parser produces

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// SOURCE
// ============================================================================

/// Source - which sanctions list an entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "SDN")]
    Sdn,
    #[serde(rename = "UN")]
    Un,
    #[serde(rename = "UAE")]
    Uae,
}

impl Source {
    /// Assembly order: SDN first, then UN, then UAE
    pub const ALL: [Source; 3] = [Source::Sdn, Source::Un, Source::Uae];

    /// Short code used in snapshots and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Source::Sdn => "SDN",
            Source::Un => "UN",
            Source::Uae => "UAE",
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Source::Sdn => "OFAC Specially Designated Nationals",
            Source::Un => "UN Security Council Consolidated List",
            Source::Uae => "UAE Local Terrorist List",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

// ============================================================================
// ALIASES
// ============================================================================

/// Aliases split by the confidence tier the source assigned them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aliases {
    #[serde(default)]
    pub good_quality: Vec<String>,
    #[serde(default)]
    pub low_quality: Vec<String>,
}

impl Aliases {
    pub fn is_empty(&self) -> bool {
        self.good_quality.is_empty() && self.low_quality.is_empty()
    }

    /// Both tiers, good quality first
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.good_quality.iter().chain(self.low_quality.iter())
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// SanctionedEntity - one parsed list entry
///
/// `name` is never empty and `source` is always set; every other field is
/// optional and its absence is not an error. Unknown fields are ignored and
/// missing ones default, so older snapshots keep deserializing as the
/// schema grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctionedEntity {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub designation: Vec<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub aliases: Aliases,
    pub source: Source,
}

impl SanctionedEntity {
    /// Create an entity with only the required fields
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        SanctionedEntity {
            id: None,
            name: name.into(),
            original_name: None,
            title: None,
            designation: Vec::new(),
            date_of_birth: None,
            nationality: None,
            passport_number: None,
            national_id: None,
            aliases: Aliases::default(),
            source,
        }
    }

    /// Builder pattern: add source-assigned identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder pattern: replace aliases
    pub fn with_aliases(mut self, aliases: Aliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Builder pattern: replace designation list
    pub fn with_designation(mut self, designation: Vec<String>) -> Self {
        self.designation = designation;
        self
    }

    /// An entity may only enter a registry with a non-blank name
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Primary name followed by every alias of both tiers
    pub fn all_names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_codes_and_order() {
        assert_eq!(Source::Sdn.code(), "SDN");
        assert_eq!(Source::Un.code(), "UN");
        assert_eq!(Source::Uae.code(), "UAE");
        assert_eq!(Source::ALL, [Source::Sdn, Source::Un, Source::Uae]);
        assert_eq!(Source::Un.to_string(), "UN");
    }

    #[test]
    fn test_source_serializes_as_code() {
        let json = serde_json::to_string(&Source::Uae).unwrap();
        assert_eq!(json, "\"UAE\"");
        let back: Source = serde_json::from_str("\"SDN\"").unwrap();
        assert_eq!(back, Source::Sdn);
    }

    #[test]
    fn test_entity_builder_and_names() {
        let entity = SanctionedEntity::new("JOHN SMITH", Source::Sdn)
            .with_id("X.1")
            .with_aliases(Aliases {
                good_quality: vec!["JONNY SMITH".to_string()],
                low_quality: vec!["J. SMITH".to_string()],
            });

        assert!(entity.is_valid());
        assert_eq!(entity.id.as_deref(), Some("X.1"));
        let names: Vec<&String> = entity.all_names().collect();
        assert_eq!(names, vec!["JOHN SMITH", "JONNY SMITH", "J. SMITH"]);
    }

    #[test]
    fn test_blank_name_is_invalid() {
        assert!(!SanctionedEntity::new("   ", Source::Uae).is_valid());
    }

    #[test]
    fn test_entity_deserializes_with_missing_optional_fields() {
        let entity: SanctionedEntity =
            serde_json::from_str(r#"{"name":"ACME LTD","source":"UAE"}"#).unwrap();
        assert_eq!(entity, SanctionedEntity::new("ACME LTD", Source::Uae));
        assert!(entity.aliases.is_empty());
    }
}
