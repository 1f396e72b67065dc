//! Initialize a new ringwatch project.

use anyhow::{Context, Result};
use colored::Colorize;
use ringwatch::prelude::*;
use std::path::Path;

use crate::config::{Config, CONFIG_FILE, DATA_DIR};

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => Path::new(&p).to_path_buf(),
        None => std::env::current_dir()?,
    };

    println!("{} Initializing ringwatch project...", "→".blue());

    // Create .ringwatch directory
    let data_dir = base_path.join(DATA_DIR);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    println!("  {} Created {}", "✓".green(), data_dir.display());

    // Create default config
    let config_path = base_path.join(CONFIG_FILE);
    let config = if !config_path.exists() {
        let config = Config::default();
        config.save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
        config
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
        Config::load_from(&config_path)?
    };
    config.plant.validate().context("Invalid plant configuration")?;

    // Create the database and store the plant's default topology
    let database = base_path.join(&config.storage.database);
    if let Some(parent) = database.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&database)
        .with_context(|| format!("Failed to create {}", database.display()))?;
    store.register_plant(&config.plant.id)?;
    let engine = DiagnosticEngine::new(config.plant.clone())?.with_storage(Box::new(store));
    match engine.activate() {
        Activation::Restored => {
            println!("  {} Default topology for {} already stored", "•".yellow(), config.plant.id.cyan())
        }
        Activation::Created { .. } => {
            println!("  {} Stored default topology for {}", "✓".green(), config.plant.id.cyan())
        }
        Activation::Degraded(reason) => {
            println!("  {} Could not store default topology: {}", "!".red(), reason)
        }
    }

    let gitignore_path = data_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, "current.json\n*.db\n*.db-wal\n*.db-shm\n")?;
        println!("  {} Created {}", "✓".green(), gitignore_path.display());
    }

    println!();
    println!("{} ringwatch project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} ringwatch status", "1.".blue());
    println!("  {} ringwatch set <segment> <strand> faulty", "2.".blue());
    println!("  {} ringwatch export report.txt", "3.".blue());

    Ok(())
}
