//! Audit-desk core: the plan-and-evidence workflow of an internal-audit
//! management system.
//!
//! The annual plan is an event-sourced aggregate (see [`domain::plan`]);
//! engagements and their satellite records live in the [`domain::catalog`];
//! uploaded evidence and its scan lifecycle in [`domain::evidence`].

pub mod audit_trail;
pub mod config;
pub mod domain;
pub mod event_store;
pub mod paths;
pub mod storage;
