//! Use-case templates and dataset property resolution

use crate::domain::model::{CreateDatasetRequest, DatasetType, QuotaMode, UseCaseTemplate};
use std::collections::BTreeMap;

/// Template defaults that only apply to filesystems
const FILESYSTEM_ONLY: [&str; 1] = ["atime"];

/// Default tunables for a workload class
pub fn template_properties(template: UseCaseTemplate) -> BTreeMap<String, String> {
    let pairs: &[(&str, &str)] = match template {
        UseCaseTemplate::General => &[("compression", "lz4")],
        UseCaseTemplate::Media => &[
            ("recordsize", "1M"),
            ("compression", "lz4"),
            ("atime", "off"),
        ],
        UseCaseTemplate::Surveillance => &[
            ("recordsize", "1M"),
            ("compression", "lz4"),
            ("atime", "off"),
            ("logbias", "throughput"),
        ],
        UseCaseTemplate::Vm => &[
            ("recordsize", "64K"),
            ("compression", "lz4"),
            ("atime", "off"),
        ],
        UseCaseTemplate::Database => &[
            ("recordsize", "16K"),
            ("compression", "lz4"),
            ("atime", "off"),
            ("logbias", "latency"),
        ],
    };
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Resolve the `-o` properties for `zfs create`
///
/// Layered lowest to highest: template defaults, quota mode, caller
/// properties. Volumes then get `recordsize` remapped to `volblocksize`
/// and lose `quota`/`reservation`, which do not apply to them.
pub fn dataset_properties(req: &CreateDatasetRequest) -> BTreeMap<String, String> {
    let is_volume = req.dataset_type == DatasetType::Volume;
    let mut props = req.use_case.map(template_properties).unwrap_or_default();

    if is_volume {
        props.retain(|k, _| !FILESYSTEM_ONLY.contains(&k.as_str()));
    }

    if req.quota > 0 {
        let quota = req.quota.to_string();
        props.insert("quota".to_string(), quota.clone());
        if req.quota_mode == QuotaMode::Fixed {
            props.insert("reservation".to_string(), quota);
        }
    }

    props.extend(req.properties.iter().map(|(k, v)| (k.clone(), v.clone())));

    if is_volume {
        if let Some(recordsize) = props.remove("recordsize") {
            props.entry("volblocksize".to_string()).or_insert(recordsize);
        }
        props.remove("quota");
        props.remove("reservation");
    }

    props
}
