//! Plant management: list, create, rename, delete and switch plants.

use anyhow::Result;
use colored::Colorize;

use super::{report, Project};
use crate::config::config_path;

pub fn list() -> Result<()> {
    let project = Project::open()?;
    let active = &project.engine.plant().id;

    println!("{} Plants:", "→".blue());
    for plant in project.engine.available_plants()? {
        if &plant == active {
            println!("  {} {} {}", "•".blue(), plant.white().bold(), "(active)".green());
        } else {
            println!("  {} {}", "•".blue(), plant);
        }
    }
    Ok(())
}

pub fn create(plant_id: &str, base: Option<String>) -> Result<()> {
    let project = Project::open()?;
    report(project.engine.create_plant(plant_id, base.as_deref()))
}

/// Rename a plant; renaming the active one also updates ringwatch.toml.
pub fn rename(old_id: &str, new_id: &str) -> Result<()> {
    let mut project = Project::open()?;
    let result = project.engine.rename_plant(old_id, new_id);
    if result.success && project.config.plant.id == old_id {
        project.config.plant.id = new_id.to_string();
        project.config.save(&config_path()?)?;
    }
    report(result)
}

pub fn delete(plant_id: &str) -> Result<()> {
    let project = Project::open()?;
    report(project.engine.delete_plant(plant_id))
}

/// Make another stored plant the active one.
///
/// The plant keeps the configured circuit layout under its own id. The
/// working topology is replaced by the new plant's default snapshot.
pub fn switch(plant_id: &str) -> Result<()> {
    let mut project = Project::open()?;
    let mut plant = project.config.plant.clone();
    plant.id = plant_id.to_string();

    let result = project.engine.set_active_plant(plant.clone());
    if result.success && project.config.plant.id != plant_id {
        project.config.plant = plant;
        project.config.save(&config_path()?)?;
        project.save()?;
    }
    report(result)
}
