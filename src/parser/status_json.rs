//! Structured `zpool status -j` document
//!
//! Newer tool releases emit status as JSON. Numeric values come out as
//! strings (`"112G"`, `"1734091200"`) or as plain numbers depending on the
//! flags used, so every scalar is read leniently into a `String` and
//! converted where it is consumed.

use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Accept string, number, bool or null and keep it as text
fn loose_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn loose_option<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = loose_string(deserializer)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

/// Top-level document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    pub output_version: Option<Value>,
    #[serde(default)]
    pub pools: IndexMap<String, PoolStatusJson>,
}

/// One pool in the document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolStatusJson {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub state: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub pool_guid: String,
    #[serde(default)]
    pub scan_stats: Option<ScanStatsJson>,
    #[serde(default)]
    pub vdevs: IndexMap<String, VdevNode>,
    #[serde(default, deserialize_with = "loose_string")]
    pub error_count: String,
}

impl PoolStatusJson {
    /// Direct children of the root vdev, in document order
    ///
    /// The tool nests everything under a single `root` vdev named after the
    /// pool. When that wrapper is missing the map is taken as the top level.
    pub fn top_level_vdevs(&self) -> Vec<&VdevNode> {
        match self.vdevs.values().find(|v| v.vdev_type == "root") {
            Some(root) => root.vdevs.values().collect(),
            None => {
                if !self.vdevs.is_empty() {
                    warn!("Pool {} has no root vdev, using top-level map", self.name);
                }
                self.vdevs.values().collect()
            }
        }
    }
}

/// Scrub/resilver counters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanStatsJson {
    #[serde(default, deserialize_with = "loose_string")]
    pub function: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub state: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub start_time: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub end_time: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub to_examine: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub examined: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub skipped: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub processed: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub errors: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub pass_start: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub issued: String,
}

/// A node of the nested vdev tree
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VdevNode {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub vdev_type: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub guid: String,
    #[serde(default, deserialize_with = "loose_option")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub class: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub state: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub read_errors: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub write_errors: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub checksum_errors: String,
    #[serde(default, deserialize_with = "loose_option")]
    pub slot: Option<String>,
    #[serde(default)]
    pub vdevs: IndexMap<String, VdevNode>,
}

/// Decode a status document; malformed JSON is an error
pub fn parse_status_document(raw: &[u8]) -> Result<StatusDocument> {
    Ok(serde_json::from_slice(raw)?)
}
