//! Error types for the audit-plan domain.

use crate::domain::types::StorageKind;
use std::fmt::{Display, Formatter};

/// Errors that can occur during domain command handling and queries.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Malformed or out-of-range input; carries the first violated field.
    Validation { field: String, message: String },
    /// Referenced entity absent.
    NotFound { entity: &'static str, id: String },
    /// Uniqueness violation (duplicate task code, duplicate email).
    Conflict { message: String },
    /// Mutation attempted on a baselined plan.
    PlanImmutable,
    /// Category-hour sum exceeds the plan's total available hours.
    AllocationExceedsTotal { allocated: f64, available: f64 },
    /// Evidence download requested on non-local storage; remote reads go
    /// through a pre-signed URL minted by the storage collaborator.
    UnsupportedStorage { kind: StorageKind },
    /// Metadata record exists but the underlying file is absent.
    FileMissing { key: String },
    /// No valid actor identity, or role not in the operation's allow-list.
    Unauthorized,
    /// Command executed on an uninitialized aggregate.
    NotInitialized,
    /// Optimistic lock failure (concurrent modification detected).
    ConcurrencyConflict { message: String },
    /// Storage/persistence failure.
    Storage { message: String },
}

impl DomainError {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing entity of a given kind.
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, message } => {
                write!(f, "validation failed on '{}': {}", field, message)
            }
            Self::NotFound { entity, id } => write!(f, "{} '{}' not found", entity, id),
            Self::Conflict { message } => write!(f, "conflict: {}", message),
            Self::PlanImmutable => write!(f, "plan is baselined and cannot be modified"),
            Self::AllocationExceedsTotal {
                allocated,
                available,
            } => write!(
                f,
                "allocated hours {} exceed total available hours {}",
                allocated, available
            ),
            Self::UnsupportedStorage { kind } => {
                write!(f, "direct download not supported for '{}' storage", kind.as_str())
            }
            Self::FileMissing { key } => write!(f, "stored file '{}' is missing", key),
            Self::Unauthorized => write!(f, "operation not permitted for this actor"),
            Self::NotInitialized => write!(f, "plan not initialized"),
            Self::ConcurrencyConflict { message } => {
                write!(f, "concurrency conflict: {}", message)
            }
            Self::Storage { message } => write!(f, "storage failure: {}", message),
        }
    }
}

impl std::error::Error for DomainError {}
