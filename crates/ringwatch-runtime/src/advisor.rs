//! Diagnostic advisor: turns connectivity, ring state and strand faults
//! into ordered findings.
//!
//! Findings come out in a fixed order:
//!
//! 1. nodes with an `error` status, then `isolated` nodes
//! 2. an all-clear when neither exists
//! 3. one entry per segment with faulty forward/return strands, with reserve
//!    reassignment proposals
//! 4. a ring-patch hint when nodes are isolated but no comms strand is faulty
//! 5. the ring integrity summary
//! 6. a closing reminder that the diagnosis is logical
//!
//! Reserves form one pool per segment shared by every direction. The pool is
//! consumed first-fit in ascending index order; a direction that cannot be
//! fully covered gets an insufficiency note and takes nothing from the pool.
//! Nothing here mutates topology state.

use crate::ring::RingIntegrity;
use ringwatch_core::roles::{StrandRole, StrandRoles};
use ringwatch_core::types::{Connectivity, SegmentRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// What to do about the faulty strands of one role on one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remedy {
    /// Move traffic onto these reserve strands.
    Reassign { reserves: Vec<u32> },
    /// Not enough healthy reserves left on the segment.
    Insufficient { available: usize, needed: usize },
}

/// Faulty strands of one role and the proposed remedy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub role: StrandRole,
    pub faulty: Vec<u32>,
    pub remedy: Remedy,
}

impl Allocation {
    /// Reserves proposed for this role; empty when insufficient.
    pub fn proposed(&self) -> &[u32] {
        match &self.remedy {
            Remedy::Reassign { reserves } => reserves,
            Remedy::Insufficient { .. } => &[],
        }
    }
}

/// Strand faults on one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentDiagnosis {
    pub segment_id: String,
    pub source: String,
    pub target: String,
    pub circuit: Option<String>,
    /// In evaluation order: forward, return, auxiliary.
    pub allocations: Vec<Allocation>,
}

impl SegmentDiagnosis {
    pub fn allocation(&self, role: StrandRole) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.role == role)
    }

    /// Total reserves proposed across every role.
    pub fn proposed_count(&self) -> usize {
        self.allocations.iter().map(|a| a.proposed().len()).sum()
    }
}

/// One advisory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Nodes whose status could not be computed.
    ErrorNodes { nodes: Vec<String> },
    /// Nodes lacking bidirectional reachability with the center.
    IsolatedNodes { nodes: Vec<String> },
    AllConnected { count: usize },
    NoFieldNodes,
    SegmentFaults(SegmentDiagnosis),
    /// Nodes are isolated but no comms strand is marked faulty.
    PatchSuspected,
    RingIntact,
    /// Keys (`"c→c′"`) of the broken handovers.
    RingBroken { links: Vec<String> },
    VerifyPhysically,
}

impl Finding {
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Finding::ErrorNodes { .. }
                | Finding::IsolatedNodes { .. }
                | Finding::SegmentFaults(_)
                | Finding::PatchSuspected
                | Finding::RingBroken { .. }
        )
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ErrorNodes { nodes } => write!(
                f,
                "ERROR in nodes: {}. Check logs and physical state.",
                nodes.join(", ")
            ),
            Finding::IsolatedNodes { nodes } => write!(
                f,
                "ISOLATED nodes (no bidirectional link with the center): {}",
                nodes.join(", ")
            ),
            Finding::AllConnected { count } => write!(
                f,
                "All {} nodes are bidirectionally connected to the center.",
                count
            ),
            Finding::NoFieldNodes => f.write_str("No field nodes are defined in the network."),
            Finding::SegmentFaults(diag) => {
                write!(f, "Segment {} ({}↔{})", diag.segment_id, diag.source, diag.target)?;
                for alloc in &diag.allocations {
                    let (from, to) = match alloc.role {
                        StrandRole::Return => (&diag.target, &diag.source),
                        _ => (&diag.source, &diag.target),
                    };
                    match alloc.role {
                        StrandRole::Forward | StrandRole::Return => {
                            write!(f, "\n  - {} ({}→{}) faulty: {:?}", alloc.role, from, to, alloc.faulty)?
                        }
                        _ => write!(f, "\n  - {} faulty: {:?}", alloc.role, alloc.faulty)?,
                    }
                    match &alloc.remedy {
                        Remedy::Reassign { reserves } => write!(
                            f,
                            "\n    -> use {} reserve(s): {:?}",
                            reserves.len(),
                            reserves
                        )?,
                        Remedy::Insufficient { available, needed } => write!(
                            f,
                            "\n    -> reserves ({}) insufficient (needs {})",
                            available, needed
                        )?,
                    }
                }
                Ok(())
            }
            Finding::PatchSuspected => f.write_str(
                "No faulty communication strands detected. Likely cause of isolation: \
                 a patching problem at the center or an unreported physical fault.",
            ),
            Finding::RingIntact => {
                f.write_str("Logical ring complete: every circuit is patched correctly at the center.")
            }
            Finding::RingBroken { links } => {
                f.write_str("Logical ring incomplete, broken circuit handovers:")?;
                for link in links {
                    write!(f, "\n  - {} interrupted", link)?;
                }
                Ok(())
            }
            Finding::VerifyPhysically => f.write_str(
                "NOTE: this diagnosis is logical. Always verify connections and equipment physically.",
            ),
        }
    }
}

/// Produces findings for one plant's strand roles.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticAdvisor<'a> {
    roles: &'a StrandRoles,
}

impl<'a> DiagnosticAdvisor<'a> {
    pub fn new(roles: &'a StrandRoles) -> Self {
        Self { roles }
    }

    pub fn advise(
        &self,
        connectivity: &BTreeMap<String, Connectivity>,
        segments: &[SegmentRecord],
        ring: &RingIntegrity,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        let with_status = |status: Connectivity| -> Vec<String> {
            connectivity
                .iter()
                .filter(|(_, s)| **s == status)
                .map(|(id, _)| id.clone())
                .collect()
        };
        let errors = with_status(Connectivity::Error);
        let isolated = with_status(Connectivity::Isolated);

        if !errors.is_empty() {
            findings.push(Finding::ErrorNodes { nodes: errors.clone() });
        }
        if !isolated.is_empty() {
            findings.push(Finding::IsolatedNodes {
                nodes: isolated.clone(),
            });
        }
        if errors.is_empty() && isolated.is_empty() {
            if connectivity.is_empty() {
                findings.push(Finding::NoFieldNodes);
            } else {
                findings.push(Finding::AllConnected {
                    count: connectivity.len(),
                });
            }
        }

        let diagnoses: Vec<_> = segments.iter().filter_map(|s| self.diagnose(s)).collect();
        let comms_fault = !diagnoses.is_empty();
        findings.extend(diagnoses.into_iter().map(Finding::SegmentFaults));

        if !comms_fault && !isolated.is_empty() {
            findings.push(Finding::PatchSuspected);
        }

        if ring.is_intact() {
            findings.push(Finding::RingIntact);
        } else {
            findings.push(Finding::RingBroken {
                links: ring.broken().map(|l| l.key()).collect(),
            });
        }

        findings.push(Finding::VerifyPhysically);
        findings
    }

    /// Strand faults of one segment, or `None` when its comms strands are healthy.
    pub fn diagnose(&self, segment: &SegmentRecord) -> Option<SegmentDiagnosis> {
        let forward = self.roles.faulty(StrandRole::Forward, &segment.strands);
        let ret = self.roles.faulty(StrandRole::Return, &segment.strands);
        if forward.is_empty() && ret.is_empty() {
            return None;
        }
        let aux = self.roles.faulty(StrandRole::Auxiliary, &segment.strands);

        let mut pool = self.roles.ok(StrandRole::Reserve, &segment.strands);
        let allocations: Vec<Allocation> = [
            (StrandRole::Forward, forward),
            (StrandRole::Return, ret),
            (StrandRole::Auxiliary, aux),
        ]
        .into_iter()
        .filter(|(_, faulty)| !faulty.is_empty())
        .map(|(role, faulty)| {
            let needed = faulty.len();
            let remedy = if pool.len() >= needed {
                Remedy::Reassign {
                    reserves: pool.drain(..needed).collect(),
                }
            } else {
                Remedy::Insufficient {
                    available: pool.len(),
                    needed,
                }
            };
            Allocation {
                role,
                faulty,
                remedy,
            }
        })
        .collect();

        Some(SegmentDiagnosis {
            segment_id: segment.id.clone(),
            source: segment.source.clone(),
            target: segment.target.clone(),
            circuit: segment.circuit.clone(),
            allocations,
        })
    }
}
