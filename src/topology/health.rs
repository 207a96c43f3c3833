//! Health & Redundancy Calculator
//!
//! Derives how many more disk failures a pool survives and how worried an
//! operator should be about it. Everything here is a pure function of the
//! flattened groups.

use crate::domain::model::{HealthState, RiskAssessment, RiskLevel, VDevGroup, VDevType};

/// Additional failures a single group survives
///
/// The layout's nominal tolerance (mirror: online disks minus one, RAIDZ:
/// parity, anything else: zero) minus one for each disk that is already not
/// ONLINE, floored at zero.
pub fn group_tolerance(group: &VDevGroup) -> u32 {
    let nominal = match group.vdev_type {
        VDevType::Mirror => (group.online_disks() as i64 - 1).max(0),
        VDevType::Raidz | VDevType::Raidz2 | VDevType::Raidz3 => {
            group.vdev_type.parity().unwrap_or(0) as i64
        }
        VDevType::Stripe | VDevType::Other(_) => 0,
    };
    let consumed = group.unhealthy_disks() as i64;
    (nominal - consumed).max(0) as u32
}

/// Weakest-link redundancy of a pool: the minimum group tolerance, or zero
/// for a pool without groups
pub fn pool_redundancy(groups: &[VDevGroup]) -> u32 {
    groups.iter().map(group_tolerance).min().unwrap_or(0)
}

/// A pool is never reported healthier than its worst group
pub fn reconcile_health(reported: HealthState, groups: &[VDevGroup]) -> HealthState {
    if reported.is_online() && groups.iter().any(|g| !g.state.is_online()) {
        HealthState::Degraded
    } else {
        reported
    }
}

/// Operator-facing classification of a pool's state
pub fn assess_risk(health: HealthState, redundancy: u32) -> RiskAssessment {
    let (level, description, recommendation) = match health {
        HealthState::Faulted => (
            RiskLevel::Critical,
            "Pool is faulted and data may already be lost".to_string(),
            "Do not write to the pool. Restore missing devices or recover from backup.".to_string(),
        ),
        HealthState::Degraded if redundancy == 0 => (
            RiskLevel::Critical,
            "Redundancy exhausted: one more disk failure will cause data loss".to_string(),
            "Replace the failed disk immediately and back up critical data.".to_string(),
        ),
        HealthState::Degraded => (
            RiskLevel::High,
            format!(
                "Pool is degraded but can still lose {} more disk{}",
                redundancy,
                if redundancy == 1 { "" } else { "s" }
            ),
            "Replace the failed disk as soon as possible.".to_string(),
        ),
        _ => (
            RiskLevel::Low,
            match redundancy {
                0 => "Pool has no redundancy".to_string(),
                n => format!("Pool can lose {} disk{} without data loss", n, if n == 1 { "" } else { "s" }),
            },
            "No action required.".to_string(),
        ),
    };

    RiskAssessment {
        health,
        can_lose_more: redundancy,
        level,
        description,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Disk;
    use crate::domain::model::HealthState::{Faulted, Offline, Online};

    fn group(vdev_type: VDevType, states: &[HealthState]) -> VDevGroup {
        VDevGroup {
            name: format!("{}-0", vdev_type),
            vdev_type,
            state: HealthState::Online,
            disks: states
                .iter()
                .enumerate()
                .map(|(i, state)| Disk {
                    name: format!("sd{}", (b'a' + i as u8) as char),
                    path: None,
                    state: *state,
                    slot: None,
                    read_errors: 0,
                    write_errors: 0,
                    checksum_errors: 0,
                    replacing: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_mirror_tolerance() {
        for online in 0..5usize {
            for failed in 0..4usize {
                let mut states = vec![Online; online];
                states.extend(std::iter::repeat(Faulted).take(failed));
                let g = group(VDevType::Mirror, &states);

                let expected = (online as i64 - 1 - failed as i64).max(0) as u32;
                assert_eq!(group_tolerance(&g), expected, "n={} f={}", online, failed);
            }
        }
    }

    #[test]
    fn test_raidz_tolerance() {
        let healthy = group(VDevType::Raidz2, &[Online; 6]);
        assert_eq!(group_tolerance(&healthy), 2);

        let one_down = group(VDevType::Raidz2, &[Online, Online, Offline, Online, Online, Online]);
        assert_eq!(group_tolerance(&one_down), 1);

        let raidz1 = group(VDevType::Raidz, &[Online, Online, Faulted, Online]);
        assert_eq!(group_tolerance(&raidz1), 0);

        let raidz3 = group(VDevType::Raidz3, &[Faulted; 5]);
        assert_eq!(group_tolerance(&raidz3), 0);
    }

    #[test]
    fn test_stripe_and_unknown_layouts() {
        assert_eq!(group_tolerance(&group(VDevType::Stripe, &[Online])), 0);
        assert_eq!(
            group_tolerance(&group(VDevType::Other("draid".into()), &[Online; 8])),
            0
        );
    }

    #[test]
    fn test_pool_redundancy_is_minimum() {
        let groups = vec![
            group(VDevType::Raidz3, &[Online; 7]),
            group(VDevType::Mirror, &[Online, Online]),
            group(VDevType::Raidz2, &[Online; 6]),
        ];
        assert_eq!(pool_redundancy(&groups), 1);
        assert_eq!(pool_redundancy(&[]), 0);
    }

    #[test]
    fn test_reconcile_health() {
        let mut degraded = group(VDevType::Mirror, &[Online, Faulted]);
        degraded.state = HealthState::Degraded;

        assert_eq!(reconcile_health(Online, &[degraded.clone()]), HealthState::Degraded);
        assert_eq!(reconcile_health(Faulted, &[degraded]), Faulted);
        assert_eq!(
            reconcile_health(Online, &[group(VDevType::Mirror, &[Online, Online])]),
            Online
        );
    }

    #[test]
    fn test_risk_levels() {
        assert_eq!(assess_risk(Faulted, 2).level, RiskLevel::Critical);

        let exhausted = assess_risk(HealthState::Degraded, 0);
        assert_eq!(exhausted.level, RiskLevel::Critical);
        assert!(exhausted.description.contains("Redundancy exhausted"));

        let high = assess_risk(HealthState::Degraded, 2);
        assert_eq!(high.level, RiskLevel::High);
        assert!(high.description.contains("2 more disks"));
        assert_eq!(high.can_lose_more, 2);

        assert_eq!(assess_risk(Online, 1).level, RiskLevel::Low);
        assert_eq!(assess_risk(HealthState::Unavail, 0).level, RiskLevel::Low);
    }
}
