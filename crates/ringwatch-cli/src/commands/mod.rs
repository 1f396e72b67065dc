//! CLI command implementations.

pub mod init;
pub mod status;
pub mod strand;
pub mod export;
pub mod snapshot;
pub mod history;
pub mod stats;
pub mod plant;
pub mod cctv;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use ringwatch::prelude::*;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{current_session_path, Config};

/// An engine bound to the project's database and working topology file.
pub struct Project {
    pub config: Config,
    pub engine: DiagnosticEngine,
    session_path: PathBuf,
}

impl Project {
    /// Open the project in the current directory tree.
    ///
    /// The working topology comes from `.ringwatch/current.json` when it
    /// exists; otherwise the plant is activated from the database.
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let session_path = current_session_path()?;
        let database = config.database_path()?;
        if !database.exists() {
            bail!("No ringwatch project found. Run {} first.", "ringwatch init".cyan());
        }

        let store = SqliteStore::open(&database)
            .with_context(|| format!("Failed to open database: {}", database.display()))?;
        store.register_plant(&config.plant.id)?;
        let engine = DiagnosticEngine::new(config.plant.clone())
            .context("Invalid plant configuration")?
            .with_storage(Box::new(store));

        if session_path.exists() {
            let snapshot = load_snapshot(&session_path)
                .with_context(|| format!("Failed to read {}", session_path.display()))?;
            engine.load_snapshot(&snapshot);
            debug!("Working topology read from {}", session_path.display());
        } else {
            let activation = engine.activate();
            debug!("Plant {} activated: {:?}", config.plant.id, activation);
            if let Activation::Degraded(reason) = activation {
                println!("{} Storage unavailable, using configured topology: {}", "!".yellow(), reason);
            }
        }

        Ok(Self {
            config,
            engine,
            session_path,
        })
    }

    /// Persist the working topology for the next invocation.
    pub fn save(&self) -> Result<()> {
        save_snapshot(&self.session_path, &self.engine.snapshot())
            .with_context(|| format!("Failed to write {}", self.session_path.display()))
    }
}

/// Print an action outcome; failures become errors.
pub fn report(result: ActionResult) -> Result<()> {
    if result.success {
        println!("{} {}", "✓".green().bold(), result.message);
        Ok(())
    } else {
        bail!(result.message)
    }
}

pub fn paint(status: Connectivity) -> colored::ColoredString {
    match status {
        Connectivity::Connected => status.as_str().green(),
        Connectivity::Isolated => status.as_str().yellow(),
        Connectivity::Error => status.as_str().red().bold(),
    }
}
