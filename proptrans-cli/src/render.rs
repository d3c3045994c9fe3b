use proptrans::{InvocationPlan, InvocationReport};
use std::path::Path;

/// Print the targets and keys a `translate` run would work on.
pub fn print_plan(plan: &InvocationPlan) {
    println!("=== Plan ===");
    println!("Source: {}", plan.source_path.display());
    println!("Source locale: {}", plan.source_locale);
    println!("Policy: {}", plan.policy);
    println!("Keys in source: {}", plan.source.len());

    if plan.targets.is_empty() {
        println!("\nNo target locales to translate into.");
        return;
    }

    for target in &plan.targets {
        let state = if target.spec.exists_on_disk {
            "existing"
        } else {
            "new"
        };
        println!(
            "\n[{}] {} ({}, {} key(s) to translate)",
            target.spec.locale,
            target.spec.path.display(),
            state,
            target.units.len()
        );
        if let Some(err) = &target.decode_error {
            println!("  ⚠️ unreadable, will be treated as empty: {}", err);
        }
        for unit in &target.units {
            println!("  - {}", unit.key);
        }
    }

    println!("\nTotal: {} translation unit(s)", plan.unit_count());
}

/// Print a per-locale summary of a finished run.
pub fn print_report(report: &InvocationReport) {
    println!("=== Translation Report ===");
    println!("Source: {}", report.source.display());
    println!("Status: {}", report.stage());
    if report.cancelled {
        println!("Cancelled: yes");
    }

    for target in report.targets.values() {
        let mark = if target.is_clean() { "✅" } else { "❌" };
        println!("\n{} [{}] {}", mark, target.locale, target.path.display());
        println!(
            "  translated: {}/{}  written: {}",
            target.succeeded_keys.len(),
            target.planned,
            if target.written { "yes" } else { "no" }
        );
        if let Some(err) = &target.decode_error {
            println!("  existing file was unreadable: {}", err);
        }
        if let Some(err) = &target.write_error {
            println!("  write failed: {}", err);
        }
        for failure in &target.failed_keys {
            println!("  - {} [{}] {}", failure.key, failure.kind, failure.message);
        }
    }

    println!(
        "\nTotal: {} succeeded, {} failed",
        report.succeeded_count(),
        report.failed_count()
    );
}

/// Write the report as pretty JSON.
pub fn write_report_json(report: &InvocationReport, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    std::fs::write(path, json)
        .map_err(|e| format!("Failed to write report to {}: {}", path.display(), e))
}
