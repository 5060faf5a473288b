// Runtime configuration, read from the environment with defaults

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    pub sources: SourcesConfig,
    pub ingest: IngestConfig,
    pub snapshot: SnapshotConfig,
    pub server: ServerConfig,
}

/// One optional document path per sanctions list
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourcesConfig {
    pub sdn_path: PathBuf,
    pub un_path: PathBuf,
    /// PDF with tables, or a CSV export of the same tables
    pub uae_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IngestConfig {
    pub chunk_dir: PathBuf,
    pub pages_per_chunk: usize,
    pub uae_name_column: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    /// Snapshots kept after each successful commit (at least 1)
    pub retain: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub reprocess_interval_hours: u64,
}

impl ServerConfig {
    pub fn reprocess_interval(&self) -> Duration {
        Duration::from_secs(self.reprocess_interval_hours.max(1) * 60 * 60)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        Config {
            sources: SourcesConfig {
                sdn_path: path("SANCTIONS_SDN_PATH", "sdnlist.pdf"),
                un_path: path("SANCTIONS_UN_PATH", "unsanctions.pdf"),
                uae_path: path("SANCTIONS_UAE_PATH", "uae_sanctions.pdf"),
            },
            ingest: IngestConfig {
                chunk_dir: path("SANCTIONS_CHUNK_DIR", "temp_sdn_chunks"),
                pages_per_chunk: parse_or(&lookup, "SANCTIONS_PAGES_PER_CHUNK", 20usize).max(1),
                uae_name_column: parse_or(&lookup, "SANCTIONS_UAE_NAME_COLUMN", 12),
            },
            snapshot: SnapshotConfig {
                path: path("SANCTIONS_SNAPSHOT_PATH", "sanctions_snapshot.db"),
                retain: parse_or(&lookup, "SANCTIONS_SNAPSHOT_RETAIN", 3usize).max(1),
            },
            server: ServerConfig {
                host: lookup("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "SERVICE_PORT", 8000),
                reprocess_interval_hours: parse_or(
                    &lookup,
                    "SANCTIONS_REPROCESS_INTERVAL_HOURS",
                    24 * 7,
                ),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
