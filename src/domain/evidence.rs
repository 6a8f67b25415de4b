//! Evidence registry: uploaded file metadata and its scan sub-lifecycle.
//!
//! An evidence record is created with a `pending` virus-scan status; only
//! the processing collaborator advances it. Deleting a locally stored
//! record releases the underlying file as well; a missing file is
//! tolerated so a record can always be removed.

use crate::domain::catalog::Catalog;
use crate::domain::errors::DomainError;
use crate::domain::types::{
    ActorId, EngagementId, EvidenceId, StorageKind, TimestampUtc, VirusScanStatus,
};
use crate::domain::validation::EvidenceDraft;
use crate::storage::FileStorage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Hard cap on evidence list reads.
pub const EVIDENCE_PAGE_SIZE: usize = 200;

/// A registered piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: EvidenceId,
    pub engagement_id: EngagementId,
    pub category: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub storage: StorageKind,
    /// Opaque key the storage backend uses for the bytes.
    pub storage_key: String,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub checksum: String,
    pub scan_status: VirusScanStatus,
    /// Text extracted by the processing collaborator, if any.
    pub ocr_text: Option<String>,
    pub uploaded_by: ActorId,
    pub uploaded_at: TimestampUtc,
}

/// Filter for evidence list reads. Present fields combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceFilter {
    /// Exact scan-status match.
    pub scan_status: Option<VirusScanStatus>,
    /// Case-insensitive substring match on file name or category.
    pub text: Option<String>,
}

impl EvidenceFilter {
    fn matches(&self, record: &EvidenceRecord) -> bool {
        if let Some(status) = self.scan_status {
            if record.scan_status != status {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !record.file_name.to_lowercase().contains(&needle)
                && !record.category.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// Scan-status counts over one engagement's evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total: usize,
    pub pending: usize,
    pub clean: usize,
    pub suspected: usize,
    pub blocked: usize,
}

/// Evidence registry backed by a catalog (for referential checks) and a
/// storage backend (for the bytes).
pub struct EvidenceService {
    catalog: Arc<Catalog>,
    storage: Arc<dyn FileStorage>,
    records: RwLock<HashMap<EvidenceId, EvidenceRecord>>,
}

impl EvidenceService {
    pub fn new(catalog: Arc<Catalog>, storage: Arc<dyn FileStorage>) -> Self {
        Self {
            catalog,
            storage,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an uploaded file: verifies the engagement exists, persists
    /// the bytes, and creates the record with a pending scan status.
    pub async fn register(
        &self,
        draft: EvidenceDraft,
        bytes: &[u8],
        uploaded_by: ActorId,
    ) -> Result<EvidenceRecord, DomainError> {
        self.catalog.require_engagement(&draft.engagement_id).await?;

        let id = EvidenceId::new();
        let storage_key = format!("{}-{}", id, draft.file_name);
        let checksum = hex_sha256(bytes);

        if draft.storage == StorageKind::Local {
            self.storage.put(&storage_key, bytes).await?;
        }

        let record = EvidenceRecord {
            id: id.clone(),
            engagement_id: draft.engagement_id,
            category: draft.category,
            file_name: draft.file_name,
            mime_type: draft.mime_type,
            file_size: draft.file_size,
            storage: draft.storage,
            storage_key,
            checksum,
            scan_status: VirusScanStatus::Pending,
            ocr_text: None,
            uploaded_by,
            uploaded_at: TimestampUtc::now(),
        };
        self.records.write().await.insert(id, record.clone());
        Ok(record)
    }

    /// Looks up an evidence record by id.
    pub async fn get(&self, id: &EvidenceId) -> Result<EvidenceRecord, DomainError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("evidence", id.to_string()))
    }

    /// Lists an engagement's evidence matching the filter, newest upload
    /// first, capped at `EVIDENCE_PAGE_SIZE` records.
    pub async fn list(
        &self,
        engagement_id: &EngagementId,
        filter: &EvidenceFilter,
    ) -> Vec<EvidenceRecord> {
        let mut records: Vec<EvidenceRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.engagement_id == engagement_id && filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        records.truncate(EVIDENCE_PAGE_SIZE);
        records
    }

    /// Scan-status counts for one engagement.
    pub async fn processing_stats(&self, engagement_id: &EngagementId) -> ProcessingStats {
        let records = self.records.read().await;
        let mut stats = ProcessingStats::default();
        for record in records.values() {
            if &record.engagement_id != engagement_id {
                continue;
            }
            stats.total += 1;
            match record.scan_status {
                VirusScanStatus::Pending => stats.pending += 1,
                VirusScanStatus::Clean => stats.clean += 1,
                VirusScanStatus::Suspected => stats.suspected += 1,
                VirusScanStatus::Blocked => stats.blocked += 1,
            }
        }
        stats
    }

    /// Records the scanner's verdict. Processor-facing; callers uploading
    /// evidence cannot set a scan status.
    pub async fn apply_scan_result(
        &self,
        id: &EvidenceId,
        status: VirusScanStatus,
    ) -> Result<EvidenceRecord, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("evidence", id.to_string()))?;
        record.scan_status = status;
        Ok(record.clone())
    }

    /// Attaches extracted text produced by the processing collaborator.
    pub async fn attach_ocr_text(
        &self,
        id: &EvidenceId,
        text: String,
    ) -> Result<EvidenceRecord, DomainError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("evidence", id.to_string()))?;
        record.ocr_text = Some(text);
        Ok(record.clone())
    }

    /// Hard-deletes a record. For locally stored evidence the underlying
    /// file is released as well; a file already gone does not block the
    /// delete.
    pub async fn delete(&self, id: &EvidenceId) -> Result<(), DomainError> {
        let record = {
            let mut records = self.records.write().await;
            records
                .remove(id)
                .ok_or_else(|| DomainError::not_found("evidence", id.to_string()))?
        };

        if record.storage == StorageKind::Local {
            match self.storage.delete(&record.storage_key).await {
                Ok(()) => {}
                Err(DomainError::FileMissing { key }) => {
                    tracing::warn!("evidence file already absent on delete: {}", key);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Returns the stored bytes of a locally stored record.
    ///
    /// Remote-backed records cannot be served from here; their bytes stay
    /// behind the storage collaborator.
    pub async fn download(&self, id: &EvidenceId) -> Result<Vec<u8>, DomainError> {
        let record = self.get(id).await?;

        if record.storage != StorageKind::Local {
            return Err(DomainError::UnsupportedStorage {
                kind: record.storage,
            });
        }

        self.storage.get(&record.storage_key).await
    }
}

/// Hex-encoded SHA-256 digest.
fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "tests/evidence_tests.rs"]
mod tests;
