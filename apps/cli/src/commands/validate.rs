//! Validation command implementation.

use anyhow::{Context, Result};
use catena_data::{analyze_file, validate_file, DataError, FileAnalysis, Severity, ValidationReport};
use colored::Colorize;
use std::path::Path;

/// Execute `catena validate`. Returns whether the file passed (no errors).
pub async fn execute(file: &Path, analyze: bool, json: bool) -> Result<bool> {
    let report = match validate_file(file) {
        Ok(report) => report,
        Err(DataError::EmptyFile(path)) => {
            eprintln!("{} file is empty: {}", "error:".red().bold(), path.display());
            return Ok(false);
        }
        Err(DataError::Io(e)) => {
            eprintln!("{} cannot read {}: {}", "error:".red().bold(), file.display(), e);
            return Ok(false);
        }
        Err(e) => return Err(e).context("validation failed"),
    };

    if json {
        let mut out = serde_json::to_value(&report)?;
        if analyze && report.is_valid() {
            let analysis = analyze_file(file).context("analysis failed")?;
            out["analysis"] = serde_json::to_value(&analysis)?;
        }
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(report.is_valid());
    }

    print_report(&report);

    if analyze && report.is_valid() {
        let analysis = analyze_file(file).context("analysis failed")?;
        print_analysis(file, &analysis);
    }

    Ok(report.is_valid())
}

fn print_report(report: &ValidationReport) {
    println!();
    println!("{}", format!("Validating {}", report.path.display()).bold().cyan());
    println!("{}", "─".repeat(60));

    for line in &report.lines {
        for finding in &line.findings {
            match finding.severity() {
                Severity::Error => {
                    println!("{} Line {}: {}", "✗".red(), line.line, finding);
                }
                Severity::Warning => {
                    println!("{} Line {}: {}", "⚠".yellow(), line.line, finding);
                }
            }
        }
        if line.valid && line.findings.is_empty() {
            println!("{} Line {}: valid", "✓".green(), line.line);
        } else if line.valid {
            println!("{} Line {}: valid (with warnings)", "✓".green(), line.line);
        }
    }

    println!();
    println!("{}", "Validation summary".bold());
    println!("{}", "─".repeat(60));
    println!("  {} Valid examples: {}", "✓".green(), report.valid_count);
    println!("  {} Warnings: {}", "⚠".yellow(), report.warning_count);
    println!("  {} Errors: {}", "✗".red(), report.error_count);
    println!("  Total lines: {}", report.total_lines);
    println!();

    if report.is_valid() {
        println!("{}", "File is valid and ready for training".bold().green());
    } else {
        println!(
            "{}",
            format!("File has {} error(s) that must be fixed", report.error_count).bold().red()
        );
    }
}

fn print_analysis(file: &Path, analysis: &FileAnalysis) {
    println!();
    println!("{}", format!("Analyzing {}", file.display()).bold().cyan());
    println!("{}", "─".repeat(60));
    println!("  Total examples: {}", analysis.total_examples);
    println!("  Total citations: {}", analysis.total_citations);
    println!("  Avg citations per example: {:.1}", analysis.avg_citations());
    println!("  Avg question length: {:.0} words", analysis.avg_question_words());
    println!("  Avg answer length: {:.0} words", analysis.avg_answer_words());
    println!();
    println!("{}", "Citation sources (top 10)".bold());
    for (source, count) in analysis.top_sources(10) {
        println!("  {source}: {count}");
    }
    println!();
}
