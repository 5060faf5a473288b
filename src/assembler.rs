// Registry Assembler - builds, persists and publishes registries
//
// reprocess(): parse SDN, UN and UAE in that order, concatenate, save a
// snapshot, then swap the shared handle. A missing input is skipped; an
// unreadable one is logged and contributes nothing. Only a failed snapshot
// save (or a run already in progress) fails the whole call, and in that
// case neither the store nor the handle has changed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::entity::{SanctionedEntity, Source};
use crate::error::{Result, SanctionsError};
use crate::parser::{get_parser, SourceParser};
use crate::registry::{RegistryHandle, SanctionsRegistry};
use crate::snapshot::{SnapshotMeta, SnapshotStore};

/// One configured source: its parser and the document it reads
struct SourceInput {
    parser: Box<dyn SourceParser>,
    path: PathBuf,
}

/// Summary of a successful reprocess run
#[derive(Debug, Clone, Serialize)]
pub struct ReprocessReport {
    pub snapshot: SnapshotMeta,
    /// Entities contributed per source code
    pub counts: BTreeMap<String, usize>,
    /// Sources whose document was absent
    pub skipped: Vec<Source>,
    /// Sources whose document could not be read
    pub failed: Vec<Source>,
    pub elapsed_ms: u64,
}

impl ReprocessReport {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

pub struct RegistryAssembler {
    inputs: Vec<SourceInput>,
    store: SnapshotStore,
    handle: RegistryHandle,
    running: Mutex<()>,
}

impl RegistryAssembler {
    /// Assembler over the configured documents, starting with an empty
    /// registry
    pub fn new(config: &Config) -> Self {
        let path_for = |source: Source| match source {
            Source::Sdn => config.sources.sdn_path.clone(),
            Source::Un => config.sources.un_path.clone(),
            Source::Uae => config.sources.uae_path.clone(),
        };

        let inputs = Source::ALL
            .iter()
            .map(|&source| SourceInput {
                parser: get_parser(source, config),
                path: path_for(source),
            })
            .collect();

        RegistryAssembler {
            inputs,
            store: SnapshotStore::new(&config.snapshot.path, config.snapshot.retain),
            handle: RegistryHandle::default(),
            running: Mutex::new(()),
        }
    }

    /// Builder pattern: replace the parser and document for the parser's
    /// source, keeping assembly order
    pub fn with_source(mut self, parser: Box<dyn SourceParser>, path: impl Into<PathBuf>) -> Self {
        let input = SourceInput {
            parser,
            path: path.into(),
        };
        match self
            .inputs
            .iter_mut()
            .find(|existing| existing.parser.source() == input.parser.source())
        {
            Some(existing) => *existing = input,
            None => self.inputs.push(input),
        }
        self
    }

    /// Shared handle readers query through
    pub fn registry(&self) -> RegistryHandle {
        self.handle.clone()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Parse every source, persist the result, then publish it.
    ///
    /// Fails fast with `ReprocessInProgress` when another run holds the
    /// guard.
    pub fn reprocess(&self) -> Result<ReprocessReport> {
        let _running = match self.running.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                warn!("Reprocess requested while another run is in progress");
                return Err(SanctionsError::ReprocessInProgress);
            }
        };

        let started = Instant::now();
        info!("Starting sanctions data reprocessing");

        let mut entities: Vec<SanctionedEntity> = Vec::new();
        let mut counts = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for input in &self.inputs {
            let source = input.parser.source();
            let parsed = match self.run_source(input) {
                Some(Ok(parsed)) => parsed,
                Some(Err(e)) => {
                    error!(%source, "Could not read {}: {}", input.path.display(), e);
                    failed.push(source);
                    Vec::new()
                }
                None => {
                    skipped.push(source);
                    Vec::new()
                }
            };
            counts.insert(source.code().to_string(), parsed.len());
            entities.extend(parsed);
        }

        let registry = SanctionsRegistry::new(entities);
        let snapshot = self.store.save(&registry)?;
        self.handle.replace(registry);

        let report = ReprocessReport {
            snapshot,
            counts,
            skipped,
            failed,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Reprocessing complete. Total entries: {} ({} ms)",
            report.total(),
            report.elapsed_ms
        );
        Ok(report)
    }

    /// `None` when the source's document is absent
    fn run_source(&self, input: &SourceInput) -> Option<Result<Vec<SanctionedEntity>>> {
        let source = input.parser.source();
        if !input.path.exists() {
            info!(%source, "Skipping, document not found: {}", input.path.display());
            return None;
        }

        info!(
            %source,
            "Parsing {} with parser v{}",
            input.path.display(),
            input.parser.version()
        );
        Some(input.parser.parse(&input.path))
    }

    /// Publish the newest snapshot. A missing or unreadable snapshot
    /// publishes an empty registry instead of failing.
    pub fn load(&self) -> Arc<SanctionsRegistry> {
        let registry = match self.store.load_latest() {
            Ok(Some((meta, registry))) => {
                info!(
                    "Loaded {} sanctioned entities from snapshot {}",
                    registry.len(),
                    meta.id
                );
                registry
            }
            Ok(None) => {
                warn!("No snapshot found at {}", self.store.path().display());
                SanctionsRegistry::default()
            }
            Err(e) => {
                warn!(
                    "Snapshot at {} is unusable, starting empty: {}",
                    self.store.path().display(),
                    e
                );
                SanctionsRegistry::default()
            }
        };

        self.handle.replace(registry);
        self.handle.current()
    }

    /// Startup policy: reprocess when forced or when no snapshot exists,
    /// otherwise load the newest snapshot
    pub fn initialize(&self, force_reprocess: bool) -> Result<Arc<SanctionsRegistry>> {
        if force_reprocess || !self.store.exists() {
            info!(force_reprocess, "Reprocessing sanctions data on startup");
            self.reprocess()?;
            Ok(self.handle.current())
        } else {
            info!("Loading existing sanctions data");
            Ok(self.load())
        }
    }

    /// Configured document path for a source
    pub fn input_path(&self, source: Source) -> Option<&Path> {
        self.inputs
            .iter()
            .find(|input| input.parser.source() == source)
            .map(|input| input.path.as_path())
    }
}
