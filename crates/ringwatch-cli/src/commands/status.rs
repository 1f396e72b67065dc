//! Network status and single-node checks.

use anyhow::Result;
use colored::Colorize;

use super::{paint, Project};

pub fn run(json: bool) -> Result<()> {
    let project = Project::open()?;
    let status = project.engine.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{} Plant {}", "→".blue(), status.plant_id.white().bold());
    println!();
    println!("{}", "Nodes:".white().bold());
    for (node, state) in &status.connectivity {
        println!("  {:<8} {}", node, paint(*state));
    }

    println!();
    println!("{}", "Ring:".white().bold());
    for link in &status.ring.links {
        let mark = if link.intact { "✓".green() } else { "✗".red() };
        println!(
            "  {} {} ({} → {})",
            mark,
            link.key(),
            link.last.as_deref().unwrap_or("-"),
            link.first.as_deref().unwrap_or("-")
        );
    }

    println!();
    println!("{}", "Findings:".white().bold());
    for finding in &status.findings {
        let text = finding.to_string();
        if finding.is_problem() {
            println!("{}", text.yellow());
        } else {
            println!("{}", text);
        }
    }

    Ok(())
}

pub fn check(node: &str) -> Result<()> {
    let project = Project::open()?;
    let status = project.engine.connectivity(node);
    println!("{} {}", node.white().bold(), paint(status));
    Ok(())
}
