//! Export a diagnostic report.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use ringwatch::prelude::*;
use std::path::Path;

use super::Project;

pub fn run(output: &str, format: &str) -> Result<()> {
    let project = Project::open()?;
    let engine = &project.engine;

    println!("{} Running diagnosis...", "→".blue());
    let status = engine.status();

    let output_path = Path::new(output);
    match format.to_lowercase().as_str() {
        "text" | "txt" => {
            export_report(output_path, &status, &engine.plant().roles)
                .with_context(|| format!("Failed to write {}", output))?;
        }
        "json" => {
            let content = serde_json::to_string_pretty(&status)?;
            std::fs::write(output_path, content)
                .with_context(|| format!("Failed to write {}", output))?;
        }
        _ => {
            bail!("Unsupported format: {}. Use 'text' or 'json'.", format);
        }
    }

    let problems = status.findings.iter().filter(|f| f.is_problem()).count();

    println!();
    println!("{} Exported to {}", "✓".green().bold(), output.cyan());
    println!("  Nodes:    {}", status.connectivity.len().to_string().cyan());
    println!("  Segments: {}", status.segments.len().to_string().cyan());
    println!("  Problems: {}", problems.to_string().cyan());

    Ok(())
}
