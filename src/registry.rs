// Sanctions Registry - the immutable, queryable set of entities
//
// A registry is built once per reprocess run and never mutated afterwards.
// Readers hold an `Arc` to the registry that was current when they asked;
// a reprocess publishes its result by swapping the handle's pointer, so a
// reader sees either the old registry or the new one, never a mixture.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::entity::{SanctionedEntity, Source};

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SanctionsRegistry {
    entities: Vec<SanctionedEntity>,
}

impl SanctionsRegistry {
    pub fn new(entities: Vec<SanctionedEntity>) -> Self {
        SanctionsRegistry { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in assembly order (SDN, then UN, then UAE)
    pub fn entities(&self) -> &[SanctionedEntity] {
        &self.entities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SanctionedEntity> {
        self.entities.iter()
    }

    pub fn into_entities(self) -> Vec<SanctionedEntity> {
        self.entities
    }

    /// Entity count per source; sources with no entities report zero
    pub fn count_by_source(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = Source::ALL
            .iter()
            .map(|source| (source.code().to_string(), 0))
            .collect();
        for entity in &self.entities {
            *counts.entry(entity.source.code().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a SanctionsRegistry {
    type Item = &'a SanctionedEntity;
    type IntoIter = std::slice::Iter<'a, SanctionedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

// ============================================================================
// HANDLE
// ============================================================================

/// Shared pointer to the current registry. Loads never block, and a swap
/// never waits for readers.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    current: Arc<ArcSwap<SanctionsRegistry>>,
}

impl RegistryHandle {
    pub fn new(registry: SanctionsRegistry) -> Self {
        RegistryHandle {
            current: Arc::new(ArcSwap::from_pointee(registry)),
        }
    }

    /// The registry current at the time of the call. Holding the returned
    /// `Arc` keeps that version alive across later swaps.
    pub fn current(&self) -> Arc<SanctionsRegistry> {
        self.current.load_full()
    }

    /// Publish a new registry; returns the one it replaced
    pub fn replace(&self, registry: SanctionsRegistry) -> Arc<SanctionsRegistry> {
        self.current.swap(Arc::new(registry))
    }

    /// Drop the handle's reference to the current registry. Readers still
    /// holding it keep their copy; new readers see an empty registry.
    pub fn shutdown(&self) -> Arc<SanctionsRegistry> {
        self.replace(SanctionsRegistry::default())
    }
}

impl Default for RegistryHandle {
    fn default() -> Self {
        RegistryHandle::new(SanctionsRegistry::default())
    }
}
