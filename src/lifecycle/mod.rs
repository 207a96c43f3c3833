//! Lifecycle - the pool, dataset and snapshot API
//!
//! - [`PoolManager`]: the operations upstream callers use
//! - Validation: input checks that run before any command is spawned
//! - Templates: use-case property defaults for new datasets
//! - Snapshot: label classification and ordering

pub mod manager;
pub mod snapshot;
pub mod templates;
pub mod validation;

pub use manager::PoolManager;
pub use snapshot::{detect_snapshot_source, sort_snapshots};
pub use templates::{dataset_properties, template_properties};
