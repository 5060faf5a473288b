// Name matching against a registry
//
// Matching is a case-insensitive substring test of the query inside the
// stored name (and, for `check`, inside each alias). The registry is scanned
// in insertion order and the first hit wins; there is no scoring.

use crate::entity::SanctionedEntity;
use crate::registry::SanctionsRegistry;

/// Lowercased, trimmed form of a query; `None` if nothing is left
pub fn normalize_query(query: &str) -> Option<String> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// First entity whose name or any alias contains `query`
pub fn check<'a>(query: &str, registry: &'a SanctionsRegistry) -> Option<&'a SanctionedEntity> {
    let query = normalize_query(query)?;
    registry
        .iter()
        .find(|entity| entity.all_names().any(|name| contains(name, &query)))
}

/// First entity whose primary name contains `query`; aliases are ignored
pub fn search_by_name<'a>(
    query: &str,
    registry: &'a SanctionsRegistry,
) -> Option<&'a SanctionedEntity> {
    let query = normalize_query(query)?;
    registry.iter().find(|entity| contains(&entity.name, &query))
}

fn contains(candidate: &str, normalized_query: &str) -> bool {
    candidate.to_lowercase().contains(normalized_query)
}
