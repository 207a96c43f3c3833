//! Flatten pass: vdev tree to `VDevGroup`s
//!
//! Every direct child of the root becomes exactly one group. Replacement
//! sub-trees are never surfaced as groups; their devices are hoisted into
//! the enclosing group's disk list.

use super::tree::{VdevInfo, VdevTree};
use crate::domain::model::{Disk, VDevGroup, VDevType};
use tracing::debug;

fn disk(info: &VdevInfo, replacing: bool) -> Disk {
    Disk {
        name: info.name.clone(),
        path: info.path.clone(),
        state: info.state,
        slot: info.slot.clone(),
        read_errors: info.read_errors,
        write_errors: info.write_errors,
        checksum_errors: info.checksum_errors,
        replacing,
    }
}

/// Devices of a replacement, in order; every one after the first is incoming
fn hoist_replacement(children: &[VdevTree], disks: &mut Vec<Disk>) {
    for (idx, child) in children.iter().enumerate() {
        disks.push(disk(child.info(), idx > 0));
    }
}

fn group_disks(children: &[VdevTree]) -> Vec<Disk> {
    let mut disks = Vec::with_capacity(children.len());
    for child in children {
        match child {
            VdevTree::Disk(info) => disks.push(disk(info, false)),
            VdevTree::Replacing { children, .. } => hoist_replacement(children, &mut disks),
            VdevTree::Group { info, .. } => {
                debug!("Treating nested group {} as a single device", info.name);
                disks.push(disk(info, false));
            }
        }
    }
    disks
}

/// Flatten one top-level vdev into a group
pub fn build_group(top: &VdevTree) -> VDevGroup {
    match top {
        VdevTree::Disk(info) => VDevGroup {
            name: info.name.clone(),
            vdev_type: VDevType::Stripe,
            state: info.state,
            disks: vec![disk(info, false)],
        },
        VdevTree::Replacing { info, children } => {
            let mut disks = Vec::with_capacity(children.len());
            hoist_replacement(children, &mut disks);
            VDevGroup {
                name: info.name.clone(),
                vdev_type: VDevType::Stripe,
                state: info.state,
                disks,
            }
        }
        VdevTree::Group {
            info,
            vdev_type,
            children,
        } => VDevGroup {
            name: info.name.clone(),
            vdev_type: vdev_type.clone(),
            state: info.state,
            disks: group_disks(children),
        },
    }
}

/// Flatten the root's children into groups, one per child
pub fn flatten(forest: &[VdevTree]) -> Vec<VDevGroup> {
    forest.iter().map(build_group).collect()
}
