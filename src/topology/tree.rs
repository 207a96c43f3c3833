//! Tagged-variant vdev tree
//!
//! The tool reports vdevs as one recursive shape where the meaning of a node
//! depends on its `vdev_type` string and whether it has children. This
//! module turns that into an explicit enum so the flatten pass can match on
//! it instead of re-inspecting strings.

use crate::domain::model::{HealthState, VDevType};
use crate::parser::size::parse_u64_lenient;
use crate::parser::status_json::VdevNode;

/// Attributes shared by every vdev node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VdevInfo {
    pub name: String,
    pub path: Option<String>,
    pub state: HealthState,
    pub slot: Option<String>,
    pub read_errors: u64,
    pub write_errors: u64,
    pub checksum_errors: u64,
}

impl From<&VdevNode> for VdevInfo {
    fn from(node: &VdevNode) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
            state: HealthState::parse(&node.state),
            slot: node.slot.clone(),
            read_errors: parse_u64_lenient(&node.read_errors),
            write_errors: parse_u64_lenient(&node.write_errors),
            checksum_errors: parse_u64_lenient(&node.checksum_errors),
        }
    }
}

/// Layout of an interior node
///
/// `zpool status -j` reports every RAIDZ level as `raidz`; the parity level
/// is only visible in the name (`raidz2-0`).
fn group_type(node: &VdevNode) -> VDevType {
    let reported = VDevType::normalize(&node.vdev_type);
    if reported != VDevType::Raidz {
        return reported;
    }
    let keyword = match node.name.rsplit_once('-') {
        Some((prefix, index)) if index.chars().all(|c| c.is_ascii_digit()) => prefix,
        _ => node.name.as_str(),
    };
    match VDevType::normalize(keyword) {
        level @ (VDevType::Raidz2 | VDevType::Raidz3) => level,
        _ => reported,
    }
}

/// One node of the vdev tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VdevTree {
    /// A leaf device
    Disk(VdevInfo),
    /// An in-progress replacement: the outgoing device first, then the incoming one
    Replacing {
        info: VdevInfo,
        children: Vec<VdevTree>,
    },
    /// A redundancy group (mirror, raidz, ...)
    Group {
        info: VdevInfo,
        vdev_type: VDevType,
        children: Vec<VdevTree>,
    },
}

impl VdevTree {
    pub fn info(&self) -> &VdevInfo {
        match self {
            VdevTree::Disk(info) => info,
            VdevTree::Replacing { info, .. } => info,
            VdevTree::Group { info, .. } => info,
        }
    }

    /// Classify a raw node and its descendants
    ///
    /// A node without children is a disk whatever its type string says.
    pub fn from_node(node: &VdevNode) -> Self {
        let info = VdevInfo::from(node);
        if node.vdevs.is_empty() {
            return VdevTree::Disk(info);
        }

        let children = node.vdevs.values().map(VdevTree::from_node).collect();
        if node.vdev_type == "replacing" {
            VdevTree::Replacing { info, children }
        } else {
            VdevTree::Group {
                info,
                vdev_type: group_type(node),
                children,
            }
        }
    }

    /// Build the top-level forest from the root vdev's direct children
    pub fn forest<'a>(nodes: impl IntoIterator<Item = &'a VdevNode>) -> Vec<VdevTree> {
        nodes.into_iter().map(VdevTree::from_node).collect()
    }
}
