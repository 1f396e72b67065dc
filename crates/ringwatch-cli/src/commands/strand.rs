//! Strand state changes.

use anyhow::Result;

use super::{report, Project};

pub fn set(segment: &str, strand: u32, state: &str, actor: Option<String>) -> Result<()> {
    let project = Project::open()?;
    let actor = actor.unwrap_or_else(|| project.config.storage.actor.clone());
    let result = project.engine.set_strand(segment, strand, state, Some(&actor));
    if result.success {
        project.save()?;
    }
    report(result)
}

pub fn restore(segment: &str) -> Result<()> {
    let project = Project::open()?;
    let result = project.engine.restore_segment(segment);
    if result.success {
        project.save()?;
    }
    report(result)
}

/// Drop the working topology and start over from the configured one.
pub fn reset() -> Result<()> {
    let project = Project::open()?;
    project.engine.reset();
    project.save()?;
    report(ringwatch::prelude::ActionResult::ok(format!(
        "Topology of {} reset to its configured state",
        project.config.plant.id
    )))
}
