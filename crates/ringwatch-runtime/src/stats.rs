//! Strand statistics per role class.

use ringwatch_core::roles::{StrandRole, StrandRoles};
use ringwatch_core::types::SegmentRecord;
use serde::{Deserialize, Serialize};

/// Healthy and total strand counts over a set of segments.
///
/// `comm_*` covers forward and return strands together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrandStatistics {
    pub comm_ok: usize,
    pub comm_total: usize,
    pub reserve_ok: usize,
    pub reserve_total: usize,
    pub aux_ok: usize,
    pub aux_total: usize,
}

impl StrandStatistics {
    pub fn compute(roles: &StrandRoles, segments: &[SegmentRecord]) -> Self {
        let mut stats = Self::default();
        for seg in segments {
            let ok = |role| roles.ok(role, &seg.strands).len();
            stats.comm_ok += ok(StrandRole::Forward) + ok(StrandRole::Return);
            stats.reserve_ok += ok(StrandRole::Reserve);
            stats.aux_ok += ok(StrandRole::Auxiliary);
        }
        let n = segments.len();
        stats.comm_total = n * (roles.forward.len() + roles.return_.len());
        stats.reserve_total = n * roles.reserve.len();
        stats.aux_total = n * roles.auxiliary.len();
        stats
    }

    /// Healthy fraction of comms strands; 1.0 when there are none.
    pub fn comm_ratio(&self) -> f64 {
        ratio(self.comm_ok, self.comm_total)
    }

    pub fn reserve_ratio(&self) -> f64 {
        ratio(self.reserve_ok, self.reserve_total)
    }

    pub fn aux_ratio(&self) -> f64 {
        ratio(self.aux_ok, self.aux_total)
    }
}

fn ratio(ok: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        ok as f64 / total as f64
    }
}
