//! Human-readable `zpool status` output
//!
//! The output is a sequence of pools. Each pool has `label: content` header
//! lines (with tab-indented continuation lines), then a `config:` table whose
//! device nesting is expressed purely by indentation:
//!
//! ```text
//!   pool: tank
//!  state: ONLINE
//!   scan: scrub repaired 0B in 00:00:01 with 0 errors on Sun Dec  8 00:24:02 2024
//! config:
//!
//!         NAME        STATE     READ WRITE CKSUM
//!         tank        ONLINE       0     0     0
//!           mirror-0  ONLINE       0     0     0
//!             sda     ONLINE       0     0     0
//!             sdb     ONLINE       0     0     0
//!
//! errors: No known data errors
//! ```
//!
//! Device rows are rebuilt into the same [`VdevNode`] tree the JSON document
//! carries, so topology resolution does not care which encoding was used.

use super::status_json::VdevNode;
use tracing::debug;

/// Top-level rows that start auxiliary device classes, not pool capacity
const AUXILIARY_SECTIONS: [&str; 3] = ["logs", "cache", "spares"];
/// Top-level rows whose children still belong to the root vdev
const ALLOCATION_SECTIONS: [&str; 2] = ["special", "dedup"];

/// Group keywords that prefix `<keyword>-<index>` vdev names
const GROUP_KEYWORDS: [&str; 8] = [
    "mirror", "raidz", "raidz1", "raidz2", "raidz3", "replacing", "spare", "draid",
];

/// One pool's worth of text status
#[derive(Debug, Clone, Default)]
pub struct TextPoolStatus {
    pub name: String,
    pub state: String,
    /// The `scan:` content plus its continuation lines, newline-joined
    pub scan: String,
    pub root: Option<VdevNode>,
    pub errors: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Devices,
}

/// Builds the vdev tree from rows in document order
#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<(usize, VdevNode)>,
    skipping: bool,
}

impl TreeBuilder {
    fn row(&mut self, depth: usize, node: VdevNode) {
        if depth == 0 {
            if self.stack.is_empty() {
                self.stack.push((0, node));
                return;
            }
            self.unwind(1);
            if ALLOCATION_SECTIONS.contains(&node.name.as_str()) {
                self.skipping = false;
            } else {
                if !AUXILIARY_SECTIONS.contains(&node.name.as_str()) {
                    debug!("Ignoring unexpected top-level device row {}", node.name);
                }
                self.skipping = true;
            }
            return;
        }

        if self.skipping || self.stack.is_empty() {
            return;
        }
        self.unwind(depth);
        self.stack.push((depth, node));
    }

    /// Pop and attach every open node at `depth` or deeper, keeping the root
    fn unwind(&mut self, depth: usize) {
        while self.stack.len() > 1 {
            let deepest = self.stack.last().map(|(d, _)| *d).unwrap_or_default();
            if deepest < depth {
                break;
            }
            if let Some((_, node)) = self.stack.pop() {
                if let Some((_, parent)) = self.stack.last_mut() {
                    parent.vdevs.insert(node.name.clone(), node);
                }
            }
        }
    }

    fn finish(mut self) -> Option<VdevNode> {
        self.unwind(1);
        let (_, mut root) = self.stack.pop()?;
        root.vdev_type = "root".to_string();
        for child in root.vdevs.values_mut() {
            infer_types(child);
        }
        Some(root)
    }
}

/// Leaves are disks; interior nodes take their type from the name prefix
fn infer_types(node: &mut VdevNode) {
    if node.vdevs.is_empty() {
        node.vdev_type = "disk".to_string();
        return;
    }
    node.vdev_type = group_keyword(&node.name).to_string();
    for child in node.vdevs.values_mut() {
        infer_types(child);
    }
}

/// `raidz2-0` becomes `raidz2`, `draid2:3d:6c:0s-0` becomes `draid`
fn group_keyword(name: &str) -> &str {
    let base = match name.rsplit_once('-') {
        Some((prefix, index)) if index.chars().all(|c| c.is_ascii_digit()) => prefix,
        _ => name,
    };
    if base.starts_with("draid") {
        return "draid";
    }
    GROUP_KEYWORDS
        .iter()
        .find(|k| **k == base)
        .copied()
        .unwrap_or(base)
}

/// Split a device row into its indentation depth and node
fn parse_device_row(line: &str) -> Option<(usize, VdevNode)> {
    let line = line.strip_prefix('\t')?;
    let trimmed = line.trim_start_matches(' ');
    let depth = (line.len() - trimmed.len()) / 2;

    let mut cells = trimmed.split_whitespace();
    let name = cells.next()?.to_string();
    let state = cells.next().unwrap_or_default().to_string();
    let read_errors = cells.next().unwrap_or_default().to_string();
    let write_errors = cells.next().unwrap_or_default().to_string();
    let checksum_errors = cells.next().unwrap_or_default().to_string();

    let path = name.starts_with('/').then(|| name.clone());
    Some((
        depth,
        VdevNode {
            path,
            state,
            read_errors,
            write_errors,
            checksum_errors,
            name,
            ..Default::default()
        },
    ))
}

/// Parse `zpool status` text into per-pool sections
///
/// Unknown header labels and malformed device rows are skipped; text mode is
/// best effort and never fails outright.
pub fn parse_status_text(text: &str) -> Vec<TextPoolStatus> {
    let mut pools: Vec<TextPoolStatus> = Vec::new();
    let mut builder = TreeBuilder::default();
    let mut section = Section::Header;
    let mut label = String::new();

    for line in text.lines() {
        match section {
            Section::Header => {
                if line.starts_with("\tNAME ") {
                    section = Section::Devices;
                    continue;
                }
                if line.trim().is_empty() {
                    continue;
                }

                // Continuation of the previous label
                if line.starts_with('\t') {
                    if label == "scan" {
                        if let Some(pool) = pools.last_mut() {
                            pool.scan.push('\n');
                            pool.scan.push_str(line.trim());
                        }
                    }
                    continue;
                }

                let Some((key, content)) = line.split_once(':') else {
                    debug!("Skipping unrecognized status line {:?}", line);
                    continue;
                };
                label = key.trim().to_string();
                let content = content.trim();

                if label == "pool" {
                    pools.push(TextPoolStatus {
                        name: content.to_string(),
                        ..Default::default()
                    });
                    continue;
                }
                let Some(pool) = pools.last_mut() else {
                    debug!("Skipping header line before any pool: {:?}", line);
                    continue;
                };
                match label.as_str() {
                    "state" => pool.state = content.to_string(),
                    "scan" => pool.scan = content.to_string(),
                    "errors" => pool.errors = Some(content.to_string()),
                    _ => {}
                }
            }
            Section::Devices => {
                if line.trim().is_empty() {
                    finish_tree(&mut builder, &mut pools);
                    section = Section::Header;
                    label.clear();
                    continue;
                }
                match parse_device_row(line) {
                    Some((depth, node)) => builder.row(depth, node),
                    None => debug!("Skipping malformed device row {:?}", line),
                }
            }
        }
    }

    if section == Section::Devices {
        finish_tree(&mut builder, &mut pools);
    }

    pools
}

fn finish_tree(builder: &mut TreeBuilder, pools: &mut [TextPoolStatus]) {
    let tree = std::mem::take(builder).finish();
    if let (Some(pool), Some(tree)) = (pools.last_mut(), tree) {
        pool.root = Some(tree);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_mirror() {
        let pools = parse_status_text(fixtures::HEALTHY_MIRROR);
        assert_eq!(pools.len(), 1);

        let pool = &pools[0];
        assert_eq!(pool.name, "tank");
        assert_eq!(pool.state, "ONLINE");
        assert!(pool.scan.starts_with("scrub repaired 0B"));
        assert_eq!(pool.errors.as_deref(), Some("No known data errors"));

        let root = pool.root.as_ref().unwrap();
        assert_eq!(root.vdev_type, "root");
        assert_eq!(root.vdevs.len(), 1);

        let mirror = &root.vdevs["mirror-0"];
        assert_eq!(mirror.vdev_type, "mirror");
        assert_eq!(mirror.vdevs.len(), 2);
        assert_eq!(mirror.vdevs["sda"].vdev_type, "disk");
        assert_eq!(mirror.vdevs["sdb"].state, "ONLINE");
    }

    #[test]
    fn test_scan_continuation_and_auxiliary_sections() {
        let pools = parse_status_text(fixtures::RESILVERING);
        let pool = &pools[0];

        let scan_lines: Vec<&str> = pool.scan.lines().collect();
        assert_eq!(scan_lines.len(), 3);
        assert!(scan_lines[0].starts_with("resilver in progress since"));
        assert!(scan_lines[2].contains("46.88% done"));

        let root = pool.root.as_ref().unwrap();
        // log and cache devices are not part of the pool's data vdevs
        assert_eq!(root.vdevs.len(), 1);

        let mirror = &root.vdevs["mirror-0"];
        let replacing = &mirror.vdevs["replacing-1"];
        assert_eq!(replacing.vdev_type, "replacing");
        let children: Vec<&str> = replacing.vdevs.keys().map(String::as_str).collect();
        assert_eq!(children, vec!["sdb", "sdc"]);
        assert_eq!(replacing.vdevs["sdb"].state, "FAULTED");
    }

    #[test]
    fn test_multiple_pools_and_special_class() {
        let pools = parse_status_text(fixtures::TWO_POOLS);
        assert_eq!(pools.len(), 2);

        let backup = pools[0].root.as_ref().unwrap();
        assert_eq!(backup.vdevs["sdx"].vdev_type, "disk");

        let tank = pools[1].root.as_ref().unwrap();
        assert_eq!(tank.vdevs.len(), 2);
        assert_eq!(tank.vdevs["raidz2-0"].vdev_type, "raidz2");
        assert_eq!(tank.vdevs["raidz2-0"].vdevs.len(), 5);
        assert_eq!(tank.vdevs["raidz2-0"].vdevs["sdc"].state, "UNAVAIL");
        assert_eq!(tank.vdevs["mirror-1"].vdev_type, "mirror");
    }

    #[test]
    fn test_group_keyword() {
        assert_eq!(group_keyword("mirror-0"), "mirror");
        assert_eq!(group_keyword("raidz1-3"), "raidz1");
        assert_eq!(group_keyword("replacing-1"), "replacing");
        assert_eq!(group_keyword("draid2:3d:6c:0s-0"), "draid");
        assert_eq!(group_keyword("ata-WDC_WD40"), "ata-WDC_WD40");
    }

    #[test]
    fn test_device_row_depth() {
        let (depth, node) = parse_device_row("\t    /dev/sda1  ONLINE  0  0  2").unwrap();
        assert_eq!(depth, 2);
        assert_eq!(node.path.as_deref(), Some("/dev/sda1"));
        assert_eq!(node.checksum_errors, "2");
        assert!(parse_device_row("no tab").is_none());
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_status_text("").is_empty());
        assert!(parse_status_text("no pools available\n").is_empty());
    }
}
