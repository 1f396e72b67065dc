//! Strand role assignment.
//!
//! Every segment of a plant carries the same number of strands, and each
//! strand index plays exactly one role. The assignment is fixed for the
//! lifetime of a plant's topology.

use crate::error::{RingError, Result};
use crate::types::{StrandMap, StrandState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role a strand index plays on every segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrandRole {
    /// Communications, center-outward direction.
    Forward,
    /// Communications, back towards the center.
    Return,
    /// Spare capacity for substituting failed strands.
    Reserve,
    /// Auxiliary/video traffic.
    Auxiliary,
}

impl StrandRole {
    pub fn tag(&self) -> &'static str {
        match self {
            StrandRole::Forward => "COMM-FWD",
            StrandRole::Return => "COMM-RET",
            StrandRole::Reserve => "RESERVE",
            StrandRole::Auxiliary => "AUX",
        }
    }
}

impl fmt::Display for StrandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Four disjoint sets of strand indices plus the strand count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandRoles {
    pub forward: BTreeSet<u32>,
    #[serde(rename = "return")]
    pub return_: BTreeSet<u32>,
    pub reserve: BTreeSet<u32>,
    pub auxiliary: BTreeSet<u32>,
    pub total: u32,
}

impl Default for StrandRoles {
    /// 16 strands: forward {1,2}, return {3,4}, reserve 5..=12, auxiliary 13..=16.
    fn default() -> Self {
        Self {
            forward: [1, 2].into_iter().collect(),
            return_: [3, 4].into_iter().collect(),
            reserve: (5..=12).collect(),
            auxiliary: (13..=16).collect(),
            total: 16,
        }
    }
}

impl StrandRoles {
    /// Check that the four sets are disjoint and inside `1..=total`.
    pub fn validate(&self) -> Result<()> {
        if self.total == 0 {
            return Err(RingError::invalid_config("strand total must be positive"));
        }
        let mut seen = BTreeSet::new();
        for (role, set) in self.sets() {
            for &idx in set {
                if idx == 0 || idx > self.total {
                    return Err(RingError::invalid_config(format!(
                        "{} strand {} outside 1..={}",
                        role, idx, self.total
                    )));
                }
                if !seen.insert(idx) {
                    return Err(RingError::invalid_config(format!(
                        "strand {} assigned to more than one role",
                        idx
                    )));
                }
            }
        }
        Ok(())
    }

    /// Role of a strand index, if it has one.
    pub fn role_of(&self, strand: u32) -> Option<StrandRole> {
        self.sets()
            .into_iter()
            .find(|(_, set)| set.contains(&strand))
            .map(|(role, _)| role)
    }

    pub fn set(&self, role: StrandRole) -> &BTreeSet<u32> {
        match role {
            StrandRole::Forward => &self.forward,
            StrandRole::Return => &self.return_,
            StrandRole::Reserve => &self.reserve,
            StrandRole::Auxiliary => &self.auxiliary,
        }
    }

    /// Forward and return indices, ascending.
    pub fn comms(&self) -> impl Iterator<Item = u32> + '_ {
        self.forward.union(&self.return_).copied()
    }

    /// Whether any strand of `role` is `ok` in `strands`.
    ///
    /// Indices absent from the map read as `ok`.
    pub fn any_ok(&self, role: StrandRole, strands: &StrandMap) -> bool {
        self.set(role).iter().any(|idx| state(strands, *idx).is_ok())
    }

    /// Indices of `role` that are `faulty` in `strands`, ascending.
    pub fn faulty(&self, role: StrandRole, strands: &StrandMap) -> Vec<u32> {
        self.set(role)
            .iter()
            .copied()
            .filter(|idx| !state(strands, *idx).is_ok())
            .collect()
    }

    /// Indices of `role` that are `ok` in `strands`, ascending.
    pub fn ok(&self, role: StrandRole, strands: &StrandMap) -> Vec<u32> {
        self.set(role)
            .iter()
            .copied()
            .filter(|idx| state(strands, *idx).is_ok())
            .collect()
    }

    fn sets(&self) -> [(StrandRole, &BTreeSet<u32>); 4] {
        [
            (StrandRole::Forward, &self.forward),
            (StrandRole::Return, &self.return_),
            (StrandRole::Reserve, &self.reserve),
            (StrandRole::Auxiliary, &self.auxiliary),
        ]
    }
}

fn state(strands: &StrandMap, idx: u32) -> StrandState {
    strands.get(&idx).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::healthy_strands;

    #[test]
    fn default_roles_are_valid() {
        let roles = StrandRoles::default();
        roles.validate().unwrap();
        assert_eq!(roles.role_of(1), Some(StrandRole::Forward));
        assert_eq!(roles.role_of(4), Some(StrandRole::Return));
        assert_eq!(roles.role_of(12), Some(StrandRole::Reserve));
        assert_eq!(roles.role_of(16), Some(StrandRole::Auxiliary));
        assert_eq!(roles.role_of(17), None);
    }

    #[test]
    fn overlapping_roles_are_rejected() {
        let mut roles = StrandRoles::default();
        roles.reserve.insert(2);
        assert!(matches!(roles.validate(), Err(RingError::Config(_))));
    }

    #[test]
    fn out_of_range_roles_are_rejected() {
        let mut roles = StrandRoles::default();
        roles.auxiliary.insert(17);
        assert!(roles.validate().is_err());
    }

    #[test]
    fn faulty_and_ok_partition_a_role() {
        let roles = StrandRoles::default();
        let mut strands = healthy_strands(16);
        strands.insert(6, StrandState::Faulty);
        strands.insert(9, StrandState::Faulty);
        assert_eq!(roles.faulty(StrandRole::Reserve, &strands), vec![6, 9]);
        assert_eq!(roles.ok(StrandRole::Reserve, &strands), vec![5, 7, 8, 10, 11, 12]);
        assert!(roles.any_ok(StrandRole::Forward, &strands));
    }

    #[test]
    fn serializes_return_key() {
        let json = serde_json::to_value(StrandRoles::default()).unwrap();
        assert_eq!(json["return"], serde_json::json!([3, 4]));
        assert_eq!(json["total"], 16);
    }
}
