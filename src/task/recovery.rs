//! Checkpoint snapshots for crash recovery.
//!
//! The worker periodically writes the claims accumulated so far plus the
//! resume index. On resubmission of the same task identity, the snapshot
//! seeds the aggregator and processing continues from the first unprocessed
//! cell. A snapshot is only ever honored when every identity field matches
//! exactly; anything else restarts from cell zero.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::types::{ClaimRecord, ProcessingIssue};

use super::types::TaskIdentity;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One checkpoint of an in-flight task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySnapshot {
    pub identity: TaskIdentity,
    pub claims: Vec<ClaimRecord>,
    pub issues: Vec<ProcessingIssue>,
    pub language_distribution: BTreeMap<String, u32>,
    /// Index of the first cell NOT covered by this snapshot.
    pub current_cell_index: usize,
    pub timestamp: String,
}

impl RecoverySnapshot {
    pub fn new(
        identity: TaskIdentity,
        claims: Vec<ClaimRecord>,
        issues: Vec<ProcessingIssue>,
        language_distribution: BTreeMap<String, u32>,
        current_cell_index: usize,
    ) -> Self {
        Self {
            identity,
            claims,
            issues,
            language_distribution,
            current_cell_index,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Persistence seam for snapshots.
///
/// `load` returns `Ok(None)` both when no snapshot exists and when a stored
/// snapshot belongs to a different identity. A failed `save` must never
/// abort the run; the worker logs it and keeps going.
pub trait RecoveryStore: Send + Sync {
    fn save(&self, snapshot: &RecoverySnapshot) -> Result<(), RecoveryError>;
    fn load(&self, identity: &TaskIdentity) -> Result<Option<RecoverySnapshot>, RecoveryError>;
    fn delete(&self, identity: &TaskIdentity) -> Result<(), RecoveryError>;
}

// ═══════════════════════════════════════════
// In-memory store (tests, embedded use)
// ═══════════════════════════════════════════

#[derive(Default)]
pub struct InMemoryRecoveryStore {
    snapshots: RwLock<HashMap<String, RecoverySnapshot>>,
}

impl InMemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for InMemoryRecoveryStore {
    fn save(&self, snapshot: &RecoverySnapshot) -> Result<(), RecoveryError> {
        let mut map = match self.snapshots.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.insert(snapshot.identity.key(), snapshot.clone());
        Ok(())
    }

    fn load(&self, identity: &TaskIdentity) -> Result<Option<RecoverySnapshot>, RecoveryError> {
        let map = match self.snapshots.read() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(map
            .get(&identity.key())
            .filter(|snap| &snap.identity == identity)
            .cloned())
    }

    fn delete(&self, identity: &TaskIdentity) -> Result<(), RecoveryError> {
        let mut map = match self.snapshots.write() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.remove(&identity.key());
        Ok(())
    }
}

// ═══════════════════════════════════════════
// JSON file store
// ═══════════════════════════════════════════

/// Snapshot-per-file JSON store under a fixed directory.
///
/// File names are UUIDv5 of the identity key, so the same task always maps
/// to the same file and distinct tasks never collide.
pub struct JsonFileRecoveryStore {
    dir: PathBuf,
}

impl JsonFileRecoveryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, identity: &TaskIdentity) -> PathBuf {
        let name = Uuid::new_v5(&Uuid::NAMESPACE_OID, identity.key().as_bytes());
        self.dir.join(format!("{name}.json"))
    }
}

impl RecoveryStore for JsonFileRecoveryStore {
    fn save(&self, snapshot: &RecoverySnapshot) -> Result<(), RecoveryError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&snapshot.identity);
        let json = serde_json::to_string(snapshot)?;
        // Write-then-rename keeps a crash mid-write from corrupting the
        // previous snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(path = %path.display(), cells = snapshot.current_cell_index, "saved recovery snapshot");
        Ok(())
    }

    fn load(&self, identity: &TaskIdentity) -> Result<Option<RecoverySnapshot>, RecoveryError> {
        let path = self.path_for(identity);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: RecoverySnapshot = serde_json::from_str(&json)?;
        if &snapshot.identity != identity {
            tracing::warn!(
                path = %path.display(),
                "snapshot identity mismatch, ignoring stale file"
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    fn delete(&self, identity: &TaskIdentity) -> Result<(), RecoveryError> {
        let path = self.path_for(identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{ClaimType, Language};

    fn identity() -> TaskIdentity {
        TaskIdentity {
            file_id: "file-1".into(),
            column_name: "claims".into(),
            sheet_name: "Sheet1".into(),
            patent_column_name: None,
        }
    }

    fn make_snapshot(cells_done: usize) -> RecoverySnapshot {
        let claim = ClaimRecord::new(
            1,
            ClaimType::Independent,
            "A widget comprising a base.".into(),
            Language::En,
            vec![],
            "1. A widget comprising a base.".into(),
            0.9,
            None,
            Some(0),
        );
        RecoverySnapshot::new(identity(), vec![claim], vec![], BTreeMap::new(), cells_done)
    }

    #[test]
    fn in_memory_save_load_delete() {
        let store = InMemoryRecoveryStore::new();
        store.save(&make_snapshot(4)).unwrap();

        let loaded = store.load(&identity()).unwrap().unwrap();
        assert_eq!(loaded.current_cell_index, 4);
        assert_eq!(loaded.claims.len(), 1);

        store.delete(&identity()).unwrap();
        assert!(store.load(&identity()).unwrap().is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecoveryStore::new(dir.path());

        store.save(&make_snapshot(7)).unwrap();
        let loaded = store.load(&identity()).unwrap().unwrap();
        assert_eq!(loaded.current_cell_index, 7);
        assert_eq!(loaded.claims[0].claim_number, 1);

        store.delete(&identity()).unwrap();
        assert!(store.load(&identity()).unwrap().is_none());
    }

    #[test]
    fn file_store_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecoveryStore::new(dir.path());
        assert!(store.load(&identity()).unwrap().is_none());
    }

    #[test]
    fn different_identity_fields_never_cross_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecoveryStore::new(dir.path());
        store.save(&make_snapshot(3)).unwrap();

        let mut other_column = identity();
        other_column.column_name = "claims_v2".into();
        let mut other_sheet = identity();
        other_sheet.sheet_name = "Sheet2".into();
        let mut with_patent = identity();
        with_patent.patent_column_name = Some("patent_no".into());

        assert!(store.load(&other_column).unwrap().is_none());
        assert!(store.load(&other_sheet).unwrap().is_none());
        assert!(store.load(&with_patent).unwrap().is_none());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecoveryStore::new(dir.path());

        store.save(&make_snapshot(2)).unwrap();
        store.save(&make_snapshot(9)).unwrap();

        let loaded = store.load(&identity()).unwrap().unwrap();
        assert_eq!(loaded.current_cell_index, 9);
    }

    #[test]
    fn delete_missing_snapshot_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRecoveryStore::new(dir.path());
        store.delete(&identity()).unwrap();
    }
}
