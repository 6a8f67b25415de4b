//! Centralized home-based storage paths for all audit-desk persistence.
//!
//! This module provides helpers for unified storage under `~/.audit-desk/`:
//! - `plans/<plan-id>/` - Per-plan event logs and snapshots
//! - `evidence/` - Locally stored evidence files
//! - `trail.jsonl` - Audit trail
//! - `config.yaml` - Optional configuration file

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// The name of the audit desk data directory.
const AUDIT_DESK_DIR: &str = ".audit-desk";

/// Returns the home-based data directory: `~/.audit-desk/`
///
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined or
/// directory creation fails.
pub fn audit_desk_home_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for audit storage")?;
    let dir = home.join(AUDIT_DESK_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the per-plan directory: `~/.audit-desk/plans/<plan-id>/`
///
/// Creates the directory if it doesn't exist.
pub fn plan_dir(plan_id: &str) -> Result<PathBuf> {
    let dir = audit_desk_home_dir()?.join("plans").join(plan_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create plan directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the event log path: `~/.audit-desk/plans/<plan-id>/events.jsonl`
pub fn plan_events_path(plan_id: &str) -> Result<PathBuf> {
    Ok(plan_dir(plan_id)?.join("events.jsonl"))
}

/// Returns the snapshot path: `~/.audit-desk/plans/<plan-id>/snapshot.json`
pub fn plan_snapshot_path(plan_id: &str) -> Result<PathBuf> {
    Ok(plan_dir(plan_id)?.join("snapshot.json"))
}

/// Returns the evidence storage root: `~/.audit-desk/evidence/`
///
/// Creates the directory if it doesn't exist.
pub fn evidence_dir() -> Result<PathBuf> {
    let dir = audit_desk_home_dir()?.join("evidence");
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create evidence directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the audit trail path: `~/.audit-desk/trail.jsonl`
pub fn trail_path() -> Result<PathBuf> {
    Ok(audit_desk_home_dir()?.join("trail.jsonl"))
}

/// Returns the configuration file path: `~/.audit-desk/config.yaml`
pub fn config_path() -> Result<PathBuf> {
    Ok(audit_desk_home_dir()?.join("config.yaml"))
}
