//! Snapshot storage
//!
//! Each completed round is written once as its own record, and a small
//! index remembers the latest completed round per tournament. Resume reads
//! the index and then the one record it points at.

use bracket_core::RoundSnapshot;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot data in {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no snapshot for tournament {tournament_id} round {round}")]
    NotFound { tournament_id: String, round: u32 },
}

/// Keyed storage of round snapshots.
pub trait SnapshotStore {
    /// Record a completed round and mark it as the tournament's latest.
    fn save(&mut self, snapshot: &RoundSnapshot) -> Result<(), StoreError>;

    /// Latest completed round for `tournament_id`, if any was recorded
    fn latest_round(&self, tournament_id: &str) -> Result<Option<u32>, StoreError>;

    fn load(&self, tournament_id: &str, round: u32) -> Result<RoundSnapshot, StoreError>;

    /// Known tournament ids, sorted
    fn tournaments(&self) -> Result<Vec<String>, StoreError>;

    fn load_latest(&self, tournament_id: &str) -> Result<Option<RoundSnapshot>, StoreError> {
        match self.latest_round(tournament_id)? {
            Some(round) => self.load(tournament_id, round).map(Some),
            None => Ok(None),
        }
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &mut S {
    fn save(&mut self, snapshot: &RoundSnapshot) -> Result<(), StoreError> {
        (**self).save(snapshot)
    }

    fn latest_round(&self, tournament_id: &str) -> Result<Option<u32>, StoreError> {
        (**self).latest_round(tournament_id)
    }

    fn load(&self, tournament_id: &str, round: u32) -> Result<RoundSnapshot, StoreError> {
        (**self).load(tournament_id, round)
    }

    fn tournaments(&self) -> Result<Vec<String>, StoreError> {
        (**self).tournaments()
    }
}

/// In-process store, for tests and throwaway runs
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStore {
    snapshots: BTreeMap<(String, u32), RoundSnapshot>,
    latest: BTreeMap<String, u32>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored round records
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&mut self, snapshot: &RoundSnapshot) -> Result<(), StoreError> {
        self.snapshots.insert(
            (snapshot.tournament_id.clone(), snapshot.round),
            snapshot.clone(),
        );
        self.latest
            .insert(snapshot.tournament_id.clone(), snapshot.round);
        Ok(())
    }

    fn latest_round(&self, tournament_id: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.latest.get(tournament_id).copied())
    }

    fn load(&self, tournament_id: &str, round: u32) -> Result<RoundSnapshot, StoreError> {
        self.snapshots
            .get(&(tournament_id.to_string(), round))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                tournament_id: tournament_id.to_string(),
                round,
            })
    }

    fn tournaments(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.latest.keys().cloned().collect())
    }
}

/// Directory-backed store.
///
/// ```text
/// results/
///   index.json                 { "<tournament id>": <latest round>, ... }
///   <tournament id>/
///     round-0001.json
///     round-0002.json
/// ```
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn round_path(&self, tournament_id: &str, round: u32) -> PathBuf {
        self.root
            .join(tournament_id)
            .join(format!("round-{:04}.json", round))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn read_index(&self) -> Result<BTreeMap<String, u32>, StoreError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Serde { path, source })
    }

    fn write_index(&self, index: &BTreeMap<String, u32>) -> Result<(), StoreError> {
        let path = self.index_path();
        let json = serde_json::to_vec_pretty(index).map_err(|source| StoreError::Serde {
            path: path.clone(),
            source,
        })?;
        write_replacing(&path, &json)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&mut self, snapshot: &RoundSnapshot) -> Result<(), StoreError> {
        let path = self.round_path(&snapshot.tournament_id, snapshot.round);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Serde {
            path: path.clone(),
            source,
        })?;
        write_replacing(&path, &json)?;

        // Index last: a crash before this line leaves the previous round as latest.
        let mut index = match self.read_index() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "unreadable snapshot index, rebuilding it");
                BTreeMap::new()
            }
        };
        index.insert(snapshot.tournament_id.clone(), snapshot.round);
        self.write_index(&index)?;

        info!(path = %path.display(), round = snapshot.round, "snapshot saved");
        Ok(())
    }

    fn latest_round(&self, tournament_id: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.read_index()?.get(tournament_id).copied())
    }

    fn load(&self, tournament_id: &str, round: u32) -> Result<RoundSnapshot, StoreError> {
        let path = self.round_path(tournament_id, round);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    tournament_id: tournament_id.to_string(),
                    round,
                })
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&contents).map_err(|source| StoreError::Serde { path, source })
    }

    fn tournaments(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_index()?.into_keys().collect())
    }
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
