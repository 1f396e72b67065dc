//! Strand audit trail.

use anyhow::Result;
use colored::Colorize;
use ringwatch::prelude::*;

use super::Project;

pub fn run(segment: Option<String>, strand: Option<u32>, limit: usize) -> Result<()> {
    let project = Project::open()?;

    let mut query = HistoryQuery::default().limit(limit);
    if let Some(segment) = segment {
        query = query.segment(segment);
    }
    if let Some(strand) = strand {
        query = query.strand(strand);
    }
    let changes = project.engine.strand_history(query)?;

    if changes.is_empty() {
        println!("{} No strand changes recorded.", "•".yellow());
        return Ok(());
    }

    for change in changes {
        let new_state = match change.new_state {
            StrandState::Ok => change.new_state.as_str().green(),
            StrandState::Faulty => change.new_state.as_str().red(),
        };
        println!(
            "{}  {:<12} F{:<3} {} → {}  {}",
            change.timestamp.format("%Y-%m-%d %H:%M:%S"),
            change.segment_id,
            change.strand,
            change.old_state,
            new_state,
            change.actor.as_deref().unwrap_or("-").dimmed()
        );
    }

    Ok(())
}
