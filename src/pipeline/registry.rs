//! Per-document processing records and state transitions

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{DocumentMeta, DocumentStatus, ProcessingStatus};

/// Status/progress notification mirrored to an optional channel so callers
/// can persist updates without the core touching their database.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub document_id: Uuid,
    pub status: ProcessingStatus,
    pub progress: u8,
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    meta: DocumentMeta,
    status: ProcessingStatus,
    progress: u8,
    chunk_count: u32,
    error: Option<String>,
    content_hash: Option<String>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    deleted: bool,
}

/// Tracks processing state for every registered document.
///
/// Only the pipeline mutates records; check-and-set transitions run under
/// the entry's shard lock so concurrent runs for one document cannot both
/// be admitted.
pub struct DocumentRegistry {
    records: DashMap<Uuid, DocumentRecord>,
    events: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            events: None,
        }
    }

    /// Mirror every status/progress transition to `sender`
    pub fn with_events(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            records: DashMap::new(),
            events: Some(sender),
        }
    }

    /// Register a document handed over by the storage layer
    pub fn register(&self, meta: DocumentMeta) {
        let id = meta.id;
        self.records.insert(
            id,
            DocumentRecord {
                meta,
                status: ProcessingStatus::Pending,
                progress: 0,
                chunk_count: 0,
                error: None,
                content_hash: None,
                created_at: Utc::now(),
                processed_at: None,
                deleted: false,
            },
        );
        self.emit(id, ProcessingStatus::Pending, 0);
    }

    /// Status snapshot; `None` for unknown or deleted documents
    pub fn status(&self, id: &Uuid) -> Option<DocumentStatus> {
        self.records.get(id).filter(|r| !r.deleted).map(|r| DocumentStatus {
            id: r.meta.id,
            status: r.status,
            progress: r.progress,
            chunk_count: r.chunk_count,
            error: r.error.clone(),
            content_hash: r.content_hash.clone(),
            created_at: r.created_at,
            processed_at: r.processed_at,
        })
    }

    /// Registered metadata; `None` for unknown or deleted documents
    pub fn meta(&self, id: &Uuid) -> Option<DocumentMeta> {
        self.records.get(id).filter(|r| !r.deleted).map(|r| r.meta.clone())
    }

    /// Ids of all live documents
    pub fn document_ids(&self) -> Vec<Uuid> {
        self.records
            .iter()
            .filter(|r| !r.deleted)
            .map(|r| *r.key())
            .collect()
    }

    /// Admit a processing run, or reject when one is already active
    pub(crate) fn begin_processing(&self, id: &Uuid) -> Result<DocumentMeta> {
        let mut record = self.records.get_mut(id).ok_or(Error::DocumentNotFound(*id))?;
        if record.deleted {
            return Err(Error::DocumentNotFound(*id));
        }
        if record.status == ProcessingStatus::Processing {
            return Err(Error::AlreadyInProgress(*id));
        }
        record.status = ProcessingStatus::Processing;
        record.progress = 0;
        record.chunk_count = 0;
        record.error = None;
        let meta = record.meta.clone();
        drop(record);
        self.emit(*id, ProcessingStatus::Processing, 0);
        Ok(meta)
    }

    /// Advance progress; never decreases and stays below 100 until completion
    pub(crate) fn set_progress(&self, id: &Uuid, progress: u8) {
        if let Some(mut record) = self.records.get_mut(id) {
            let clamped = progress.min(99).max(record.progress);
            record.progress = clamped;
            drop(record);
            self.emit(*id, ProcessingStatus::Processing, clamped);
        }
    }

    pub(crate) fn mark_completed(&self, id: &Uuid, chunk_count: u32, content_hash: String) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.status = ProcessingStatus::Completed;
            record.progress = 100;
            record.chunk_count = chunk_count;
            record.content_hash = Some(content_hash);
            record.processed_at = Some(Utc::now());
            drop(record);
            self.emit(*id, ProcessingStatus::Completed, 100);
        }
    }

    /// Mark failed; progress is left where the run stopped
    pub(crate) fn mark_failed(&self, id: &Uuid, message: &str) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.status = ProcessingStatus::Failed;
            record.chunk_count = 0;
            record.error = Some(message.to_string());
            let progress = record.progress;
            drop(record);
            self.emit(*id, ProcessingStatus::Failed, progress);
        }
    }

    /// Tombstone a document; an in-flight run will skip its final upsert
    pub(crate) fn mark_deleted(&self, id: &Uuid) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.deleted = true;
        }
    }

    /// Deleted or never registered
    pub(crate) fn is_deleted(&self, id: &Uuid) -> bool {
        self.records.get(id).map(|r| r.deleted).unwrap_or(true)
    }

    /// Drop the record once cascade deletion has finished
    pub(crate) fn remove(&self, id: &Uuid) {
        self.records.remove(id);
    }

    /// Reset a failed or completed document so it can be processed again
    pub(crate) fn reset(&self, id: &Uuid) -> Result<()> {
        let mut record = self.records.get_mut(id).ok_or(Error::DocumentNotFound(*id))?;
        if record.deleted {
            return Err(Error::DocumentNotFound(*id));
        }
        if record.status == ProcessingStatus::Processing {
            return Err(Error::AlreadyInProgress(*id));
        }
        record.status = ProcessingStatus::Pending;
        record.progress = 0;
        record.chunk_count = 0;
        record.error = None;
        Ok(())
    }

    fn emit(&self, document_id: Uuid, status: ProcessingStatus, progress: u8) {
        if let Some(sender) = &self.events {
            let _ = sender.send(ProgressEvent {
                document_id,
                status,
                progress,
            });
        }
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
