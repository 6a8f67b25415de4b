//! External services for the plan aggregate.
//!
//! Services provide external dependencies (time, capacity fallbacks) to the
//! aggregate and read layer without coupling them to specific
//! implementations.

use crate::domain::types::{CapacityProfile, TimestampUtc};
use serde::{Deserialize, Serialize};

/// Services injected into the plan aggregate for command handling.
#[derive(Debug, Clone, Default)]
pub struct PlanServices {
    pub clock: PlanClock,
}

/// Clock service for timestamp generation.
#[derive(Debug, Clone, Default)]
pub struct PlanClock;

impl PlanClock {
    /// Returns the current UTC timestamp.
    pub fn now(&self) -> TimestampUtc {
        TimestampUtc::now()
    }
}

/// Fallback capacity profile used when a plan has no persisted capacity.
///
/// Injected into the read path (not inlined) so deployments and tests can
/// override it. The documented default constants are total=2080,
/// audit=1500, advisory=300, training=180, admin=100 hours and must be
/// reproduced exactly for compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityDefaults {
    pub total: f64,
    pub audit: f64,
    pub advisory: f64,
    pub training: f64,
    pub admin: f64,
}

impl Default for CapacityDefaults {
    fn default() -> Self {
        Self {
            total: 2080.0,
            audit: 1500.0,
            advisory: 300.0,
            training: 180.0,
            admin: 100.0,
        }
    }
}

impl CapacityDefaults {
    /// Materializes the defaults as a capacity profile.
    pub fn profile(&self) -> CapacityProfile {
        CapacityProfile {
            total: self.total,
            audit: self.audit,
            advisory: self.advisory,
            training: self.training,
            admin: self.admin,
        }
    }
}
