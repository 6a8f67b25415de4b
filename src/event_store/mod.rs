//! Event persistence for the plan aggregate.

pub mod file_store;

pub use file_store::{FileEventStore, PlanStreamContext, StoredEvent, StoredSnapshot};
