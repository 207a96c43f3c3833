//! Input validation for mutating operations
//!
//! Every check runs before a command is spawned, so rejected input never has
//! side effects.

use crate::domain::model::VDevType;
use crate::error::{Error, Result};

/// Pool name prefixes the tool reserves for vdev keywords
const RESERVED_POOL_PREFIXES: [&str; 4] = ["mirror", "raidz", "draid", "spare"];

/// Require a non-empty identifier
pub fn require(kind: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} name is required", kind)));
    }
    Ok(())
}

pub fn validate_pool_name(name: &str) -> Result<()> {
    require("pool", name)?;

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(Error::validation(format!(
            "pool name must start with a letter: {}",
            name
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
    {
        return Err(Error::validation(format!(
            "pool name contains invalid character {:?}: {}",
            bad, name
        )));
    }
    if name == "log" || RESERVED_POOL_PREFIXES.iter().any(|r| name.starts_with(r)) {
        return Err(Error::validation(format!("pool name is reserved: {}", name)));
    }
    Ok(())
}

/// Check a RAID layout against the number of devices it is built from
///
/// Returns `None` for a plain stripe, which takes no layout keyword.
pub fn validate_layout(raid_type: &str, devices: &[String]) -> Result<Option<VDevType>> {
    if devices.is_empty() {
        return Err(Error::validation("at least one device is required"));
    }
    if let Some(dev) = devices.iter().find(|d| d.trim().is_empty()) {
        return Err(Error::validation(format!("invalid device path: {:?}", dev)));
    }

    let layout = match raid_type.trim() {
        "" | "stripe" => return Ok(None),
        "mirror" => VDevType::Mirror,
        "raidz" | "raidz1" => VDevType::Raidz,
        "raidz2" => VDevType::Raidz2,
        "raidz3" => VDevType::Raidz3,
        other => {
            return Err(Error::validation(format!("unsupported RAID type: {}", other)));
        }
    };

    let minimum = match layout.parity() {
        Some(parity) => parity as usize + 1,
        None => 2,
    };
    if devices.len() < minimum {
        return Err(Error::validation(format!(
            "{} requires at least {} devices, got {}",
            layout,
            minimum,
            devices.len()
        )));
    }
    Ok(Some(layout))
}

/// Datasets are always below a pool root (`pool/path`)
pub fn validate_dataset_name(name: &str) -> Result<()> {
    require("dataset", name)?;
    if name.contains('@') {
        return Err(Error::validation(format!(
            "dataset name must not contain '@': {}",
            name
        )));
    }
    if !name.contains('/') || name.starts_with('/') || name.ends_with('/') {
        return Err(Error::validation(format!(
            "dataset name must be of the form pool/path: {}",
            name
        )));
    }
    Ok(())
}

/// Snapshot identifiers are `dataset@label`
pub fn validate_snapshot_id(name: &str) -> Result<()> {
    require("snapshot", name)?;
    match name.split_once('@') {
        Some((dataset, label)) if !dataset.is_empty() && !label.is_empty() => Ok(()),
        _ => Err(Error::validation(format!(
            "snapshot name must be of the form dataset@snapshot: {}",
            name
        ))),
    }
}

pub fn validate_property(key: &str, value: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("property key is required"));
    }
    if key.contains('=') || key.contains(char::is_whitespace) {
        return Err(Error::validation(format!("invalid property key: {}", key)));
    }
    if value.contains('\n') {
        return Err(Error::validation(format!(
            "property value for {} must be a single line",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn devices(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/dev/sd{}", (b'a' + i as u8) as char)).collect()
    }

    #[test]
    fn test_pool_names() {
        assert!(validate_pool_name("tank").is_ok());
        assert!(validate_pool_name("backup-01").is_ok());
        assert_matches!(validate_pool_name(""), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("1tank"), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("tank/data"), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("my pool"), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("mirror"), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("raidz2"), Err(Error::Validation(_)));
        assert_matches!(validate_pool_name("log"), Err(Error::Validation(_)));
        assert!(validate_pool_name("logs").is_ok());
    }

    #[test]
    fn test_layout_minimums() {
        assert_eq!(validate_layout("", &devices(1)).unwrap(), None);
        assert_eq!(validate_layout("stripe", &devices(3)).unwrap(), None);
        assert_eq!(validate_layout("mirror", &devices(2)).unwrap(), Some(VDevType::Mirror));
        assert_eq!(validate_layout("raidz1", &devices(2)).unwrap(), Some(VDevType::Raidz));
        assert_eq!(validate_layout("raidz3", &devices(4)).unwrap(), Some(VDevType::Raidz3));

        assert!(validate_layout("mirror", &devices(1)).is_err());
        assert!(validate_layout("raidz2", &devices(2)).is_err());
        assert!(validate_layout("raidz3", &devices(3)).is_err());
        assert!(validate_layout("raid10", &devices(4)).is_err());
        assert!(validate_layout("", &[]).is_err());
        assert!(validate_layout("", &["".to_string()]).is_err());
    }

    #[test]
    fn test_dataset_names() {
        assert!(validate_dataset_name("tank/media").is_ok());
        assert!(validate_dataset_name("tank/a/b").is_ok());
        assert!(validate_dataset_name("tank").is_err());
        assert!(validate_dataset_name("tank/").is_err());
        assert!(validate_dataset_name("tank/data@snap").is_err());
        assert!(validate_dataset_name("  ").is_err());
    }

    #[test]
    fn test_snapshot_ids() {
        assert!(validate_snapshot_id("tank/data@daily").is_ok());
        assert!(validate_snapshot_id("tank/data").is_err());
        assert!(validate_snapshot_id("tank/data@").is_err());
        assert!(validate_snapshot_id("@daily").is_err());
        assert!(validate_snapshot_id("").is_err());
    }

    #[test]
    fn test_properties() {
        assert!(validate_property("compression", "zstd").is_ok());
        assert!(validate_property("", "on").is_err());
        assert!(validate_property("a=b", "on").is_err());
        assert!(validate_property("atime", "off\nrecordsize=1M").is_err());
    }
}
