//! Readiness command implementation.

use anyhow::{Context, Result};
use catena_data::{check_readiness, ReadinessBand, ReadinessConfig, ReadinessReport};
use colored::Colorize;
use std::path::PathBuf;

/// Execute `catena readiness`. The recommendation is advisory; the command
/// always succeeds when the directory could be scanned.
pub async fn execute(data_dir: PathBuf, json: bool) -> Result<()> {
    let config = ReadinessConfig::for_dir(data_dir);
    let report = check_readiness(&config)
        .with_context(|| format!("failed to scan {}", config.data_dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &ReadinessReport) {
    println!();
    println!("{}", "Fine-tuning readiness check".bold().cyan());
    println!("{}", "─".repeat(60));

    for file in &report.files {
        println!("  {} {}: {} examples", "✓".green(), file.name, file.examples);
    }
    for (name, error) in &report.read_errors {
        println!("  {} {}: {}", "✗".red(), name, error);
    }

    println!();
    println!("{}", "Summary".bold());
    println!("  Total training files: {}", report.valid_files);
    println!("  Total training examples: {}", report.total_examples);

    println!();
    println!("{}", "Requirements check".bold());
    for (desc, threshold, passed) in report.threshold_checks() {
        let mark = if passed { "✓".green() } else { "✗".red() };
        println!("  {} {}: {}/{}", mark, desc, report.total_examples, threshold);
    }

    if report.total_examples > 0 {
        println!();
        println!("{}", "Estimated fine-tuning costs".bold());
        println!("  Estimated tokens: {}", report.estimated_tokens());
        println!("  Training cost: ${:.2}", report.estimated_cost());
        println!(
            "  With {} hyperparameter runs: ${:.2}",
            report.config.tuning_runs,
            report.estimated_cost_all_runs()
        );
    }

    println!();
    match report.band() {
        ReadinessBand::Insufficient => {
            let needed = report.config.min_examples.saturating_sub(report.total_examples);
            println!("{}", "INSUFFICIENT DATA - create more training examples".bold().red());
            println!("  Need at least {needed} more examples before fine-tuning");
        }
        ReadinessBand::Minimal => {
            println!(
                "{}",
                "MINIMAL DATA - fine-tuning possible but results may be limited".bold().yellow()
            );
            println!("  Consider adding more examples for better results");
        }
        ReadinessBand::Ready => {
            println!("{}", "GOOD DATA VOLUME - ready for fine-tuning".bold().green());
            println!("  Proceed with the cloud customization setup");
        }
    }
    println!();
}
