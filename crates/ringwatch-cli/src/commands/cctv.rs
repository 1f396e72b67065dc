//! CCTV inventory of the active plant.

use anyhow::{Context, Result};
use colored::Colorize;
use ringwatch::prelude::CctvConfig;

use super::{report, Project};

pub fn show(json: bool) -> Result<()> {
    let project = Project::open()?;
    let cctv = project.engine.load_cctv_config();

    if json {
        println!("{}", serde_json::to_string_pretty(&cctv)?);
        return Ok(());
    }
    if cctv.is_empty() {
        println!("{} No CCTV sites for {}.", "•".yellow(), project.engine.plant().id);
        return Ok(());
    }

    println!(
        "{} CCTV for {} ({} cameras):",
        "→".blue(),
        project.engine.plant().id.white().bold(),
        cctv.total_cameras().to_string().cyan()
    );
    for (node, site) in &cctv.sites {
        println!("  {:<8} {} camera(s)  poles: {}", node, site.cameras, site.poles.join(", "));
    }
    Ok(())
}

/// Replace the stored inventory with the contents of a JSON file.
pub fn import(path: &str) -> Result<()> {
    let project = Project::open()?;
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let cctv = CctvConfig::from_json(&json).with_context(|| format!("Failed to parse {}", path))?;
    report(project.engine.save_cctv_config(&cctv))
}
