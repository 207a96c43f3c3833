//! Parsers for storage tool output
//!
//! Pure functions over captured stdout. Nothing here runs a process.

pub mod size;
pub mod status_json;
pub mod status_text;
pub mod tabular;

pub use size::{format_size, parse_duration, parse_size, parse_u64_lenient};
pub use status_json::{parse_status_document, PoolStatusJson, ScanStatsJson, StatusDocument, VdevNode};
pub use status_text::{parse_status_text, TextPoolStatus};
pub use tabular::{parse_dataset_list, parse_pool_list, parse_snapshot_list, PoolListRow, SnapshotListRow};
