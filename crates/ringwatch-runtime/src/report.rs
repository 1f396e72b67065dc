//! Plain-text diagnostic report.

use crate::engine::NetworkStatus;
use ringwatch_core::roles::StrandRoles;
use std::path::Path;

const RULE: &str = "========================================";

/// Render a status report: header, node connectivity, per-segment strand
/// listing tagged by role, then the findings.
pub fn render_report(status: &NetworkStatus, roles: &StrandRoles) -> String {
    let mut lines = vec![
        RULE.to_string(),
        "FIBER RING DIAGNOSTIC REPORT".to_string(),
        format!("Plant: {}", status.plant_id),
        format!("Date: {}", status.generated.format("%Y-%m-%d %H:%M:%S UTC")),
        RULE.to_string(),
        String::new(),
        "NODE CONNECTIVITY:".to_string(),
        "------------------".to_string(),
    ];
    for (node, state) in &status.connectivity {
        lines.push(format!("- {}: {}", node, state));
    }

    lines.push(String::new());
    lines.push("SEGMENTS:".to_string());
    lines.push("---------".to_string());
    for seg in &status.segments {
        lines.push(String::new());
        lines.push(format!("Segment: {} ({}↔{})", seg.id, seg.source, seg.target));
        lines.push(format!("Circuit: {}", seg.circuit.as_deref().unwrap_or("N/A")));
        lines.push(format!("Comm status: {}", seg.comm_status));
        lines.push("Strands:".to_string());
        for (idx, state) in &seg.strands {
            let tag = roles.role_of(*idx).map_or("?", |r| r.tag());
            lines.push(format!("  - F{} ({}): {}", idx, tag, state));
        }
    }

    lines.push(String::new());
    lines.push("FINDINGS:".to_string());
    lines.push("---------".to_string());
    if status.findings.is_empty() {
        lines.push("No findings available.".to_string());
    }
    lines.extend(status.findings.iter().map(ToString::to_string));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render and write a report, creating parent directories.
pub fn export_report(path: &Path, status: &NetworkStatus, roles: &StrandRoles) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_report(status, roles))
}
