// Sanctions Registry - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod assembler;
pub mod config;
pub mod document;   // PDF layout, column extraction, chunking, tables
pub mod entity;
pub mod error;
pub mod matcher;
pub mod parser;     // SDN, UN and UAE list dialects
pub mod registry;
pub mod screening;
pub mod snapshot;

// Re-export commonly used types
pub use assembler::{RegistryAssembler, ReprocessReport};
pub use config::{Config, IngestConfig, ServerConfig, SnapshotConfig, SourcesConfig};
pub use entity::{Aliases, SanctionedEntity, Source};
pub use error::{EntryOutcome, Result, SanctionsError};
pub use matcher::{check, search_by_name};
pub use parser::{get_parser, SdnParser, SourceParser, TextParser, UaeParser, UnParser};
pub use registry::{RegistryHandle, SanctionsRegistry};
pub use screening::{
    is_suspicious, HolderName, IdentityDocumentReader, Mention, MentionsLookup, Screener,
    ScreeningOutcome,
};
pub use snapshot::{SnapshotMeta, SnapshotStore, FORMAT_VERSION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
