//! Capped local history for analysis records.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::records::{
    BroodInput, BroodPatternRecord, QueenCellInput, QueenCellRecord, RecordKind,
};
use crate::error::StorageError;
use crate::storage::StorageBackend;

/// Storage key for queen-cell analyses.
pub const QUEEN_STORAGE_KEY: &str = "ibrood_queen_cell_analyses";

/// Storage key for brood-pattern analyses.
pub const BROOD_STORAGE_KEY: &str = "ibrood_brood_analyses";

/// Maximum records kept per kind; older entries are silently dropped.
pub const RETENTION_CAP: usize = 20;

/// A record kind that can live in a [`HistoryStore`].
pub trait HistoryRecord: Serialize + DeserializeOwned + Clone {
    /// Raw analysis result this record is built from.
    type Input;

    /// Storage key the kind persists under.
    const STORAGE_KEY: &'static str;

    /// Build a record from a raw result, assigning identity and clearing
    /// image payloads.
    fn from_input(input: Self::Input, timestamp: i64) -> Self;

    /// The record's opaque identifier.
    fn id(&self) -> &str;
}

impl HistoryRecord for QueenCellRecord {
    type Input = QueenCellInput;

    const STORAGE_KEY: &'static str = QUEEN_STORAGE_KEY;

    fn from_input(input: QueenCellInput, timestamp: i64) -> Self {
        Self {
            id: timestamp.to_string(),
            timestamp,
            kind: RecordKind::Queen,
            total_queen_cells: input.total_queen_cells,
            cells: input.cells,
            maturity_distribution: input.maturity_distribution,
            recommendations: input.recommendations,
            image_preview: String::new(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl HistoryRecord for BroodPatternRecord {
    type Input = BroodInput;

    const STORAGE_KEY: &'static str = BROOD_STORAGE_KEY;

    fn from_input(input: BroodInput, timestamp: i64) -> Self {
        let health_score = input.resolved_score();
        let health_status = input.resolved_status();
        Self {
            id: timestamp.to_string(),
            timestamp,
            kind: RecordKind::Brood,
            total_detections: input.total_detections,
            counts: input.counts,
            health_score,
            health_status,
            brood_coverage: input.brood_coverage,
            recommendations: input.recommendations,
            image_preview: String::new(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Append-only, capped, newest-first store for one analysis kind.
///
/// Persistence is a whole-list read-modify-write against the injected
/// [`StorageBackend`]: a second process writing the same key races
/// last-writer-wins with no isolation. That weak-consistency trade-off
/// matches the single-user, single-device usage model.
///
/// The store never deduplicates by content; callers are expected to
/// save each completed analysis exactly once.
#[derive(Clone)]
pub struct HistoryStore<R> {
    backend: Arc<dyn StorageBackend>,
    _kind: PhantomData<fn() -> R>,
}

impl HistoryStore<QueenCellRecord> {
    /// Queen-cell history over the given backend.
    pub fn queen(backend: Arc<dyn StorageBackend>) -> Self {
        Self::over(backend)
    }
}

impl HistoryStore<BroodPatternRecord> {
    /// Brood-pattern history over the given backend.
    pub fn brood(backend: Arc<dyn StorageBackend>) -> Self {
        Self::over(backend)
    }
}

impl<R: HistoryRecord> HistoryStore<R> {
    fn over(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            _kind: PhantomData,
        }
    }

    /// Persist a completed analysis and return the stored record.
    ///
    /// Assigns a fresh id and timestamp, clears any image payload,
    /// prepends the record, and truncates to [`RETENTION_CAP`] entries
    /// before the write. If the write fails the persisted history for
    /// this kind is dropped and the record is still returned, so the
    /// current action succeeds at the cost of old entries.
    pub fn save(&self, input: R::Input) -> R {
        self.save_at(input, Utc::now().timestamp_millis())
    }

    fn save_at(&self, input: R::Input, timestamp: i64) -> R {
        let record = R::from_input(input, timestamp);

        let mut records = self.list();
        records.insert(0, record.clone());
        records.truncate(RETENTION_CAP);

        if let Err(e) = self.persist(&records) {
            tracing::warn!(
                key = R::STORAGE_KEY,
                "storage write failed, clearing old data: {e}"
            );
            if let Err(e) = self.backend.remove(R::STORAGE_KEY) {
                tracing::warn!(key = R::STORAGE_KEY, "failed to clear history: {e}");
            }
        }

        record
    }

    /// All records for this kind, newest first.
    ///
    /// Never fails: a missing, unavailable, or unreadable backing value
    /// reads as an empty history.
    pub fn list(&self) -> Vec<R> {
        let raw = match self.backend.get(R::STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = R::STORAGE_KEY, "storage read failed: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key = R::STORAGE_KEY, "ignoring unreadable history: {e}");
                Vec::new()
            }
        }
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<R> {
        self.list().into_iter().next()
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.list().len()
    }

    /// Remove the record with `id`. Unknown ids are a no-op.
    pub fn delete(&self, id: &str) {
        let remaining: Vec<R> = self.list().into_iter().filter(|r| r.id() != id).collect();
        if let Err(e) = self.persist(&remaining) {
            tracing::warn!(key = R::STORAGE_KEY, "failed to persist deletion: {e}");
        }
    }

    /// Remove every record for this kind.
    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(R::STORAGE_KEY) {
            tracing::warn!(key = R::STORAGE_KEY, "failed to clear history: {e}");
        }
    }

    fn persist(&self, records: &[R]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|e| StorageError::WriteFailed {
            key: R::STORAGE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.backend.set(R::STORAGE_KEY, &json)
    }
}
