//! Named snapshot commands.

use anyhow::Result;
use colored::Colorize;

use super::{report, Project};

pub fn save(name: &str, default: bool) -> Result<()> {
    let project = Project::open()?;
    report(project.engine.save_configuration(name, default))
}

pub fn load(name: &str) -> Result<()> {
    let project = Project::open()?;
    report(project.engine.load_configuration(name))?;
    project.save()?;
    println!("  Nodes:    {}", project.engine.store().node_count().to_string().cyan());
    println!("  Segments: {}", project.engine.store().segment_count().to_string().cyan());
    Ok(())
}

pub fn delete(name: &str) -> Result<()> {
    let project = Project::open()?;
    report(project.engine.delete_configuration(name))
}

pub fn list() -> Result<()> {
    let project = Project::open()?;
    let configs = project.engine.list_configurations()?;

    if configs.is_empty() {
        println!("{} No saved snapshots.", "•".yellow());
        return Ok(());
    }

    println!("{} Saved snapshots for {}:", "→".blue(), project.config.plant.id.white().bold());
    println!();
    for config in configs {
        let marker = if config.is_default { " (default)".green().to_string() } else { String::new() };
        println!(
            "  {} {}{}  modified {}",
            "•".blue(),
            config.name.white().bold(),
            marker,
            config.modified.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
