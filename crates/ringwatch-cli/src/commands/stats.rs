//! Show segment and strand statistics.

use anyhow::Result;
use colored::Colorize;
use ringwatch::prelude::*;

use super::Project;

pub fn run() -> Result<()> {
    let project = Project::open()?;
    let engine = &project.engine;
    let segments = engine.store().segments();
    let stats = engine.strand_statistics(&segments);
    let roles = &engine.plant().roles;

    println!("{} Plant {}", "→".blue(), engine.plant().id.white().bold());
    println!();
    println!("{}", "Topology:".white().bold());
    println!("  Nodes:    {}", engine.store().node_count().to_string().cyan());
    println!("  Segments: {}", segments.len().to_string().cyan());
    println!("  Circuits: {}", engine.plant().circuits.len().to_string().cyan());

    println!();
    println!("{}", "Strands:".white().bold());
    print_ratio("Comms", stats.comm_ok, stats.comm_total, stats.comm_ratio());
    print_ratio("Reserve", stats.reserve_ok, stats.reserve_total, stats.reserve_ratio());
    print_ratio("Auxiliary", stats.aux_ok, stats.aux_total, stats.aux_ratio());

    let degraded: Vec<&SegmentRecord> = segments
        .iter()
        .filter(|s| s.strands.values().any(|v| !v.is_ok()))
        .collect();
    if !degraded.is_empty() {
        println!();
        println!("{}", "Segments with faulty strands:".white().bold());
        for seg in degraded {
            let faulty: Vec<String> = seg
                .strands
                .iter()
                .filter(|(_, v)| !v.is_ok())
                .map(|(idx, _)| match roles.role_of(*idx) {
                    Some(role) => format!("F{} ({})", idx, role.tag()),
                    None => format!("F{}", idx),
                })
                .collect();
            let comm = match seg.comm_status {
                CommStatus::Ok => seg.comm_status.as_str().green(),
                CommStatus::Faulty => seg.comm_status.as_str().red(),
            };
            println!("  {} [{}] {}", seg.id.white(), comm, faulty.join(", "));
        }
    }

    Ok(())
}

fn print_ratio(label: &str, ok: usize, total: usize, ratio: f64) {
    let pct = format!("{:.1}%", ratio * 100.0);
    let pct = if ok == total { pct.green() } else { pct.yellow() };
    println!("  {:<10} {}/{} ({})", label, ok, total, pct);
}
