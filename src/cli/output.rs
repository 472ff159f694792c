use colored::*;

use crate::cleaner::CleanReport;
use crate::common::format::{self, format_path, format_safety, format_size, format_size_colored};
use crate::duplicates::DuplicateReport;
use crate::scanner::types::{Category, CategoryId, ScanResult, ScanSummary};

/// Print scan results in human-readable format
pub fn print_scan_results(summary: &ScanSummary, detailed: bool) {
    println!();
    println!("{}  reclaim Scan Results", "🧹");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} reclaimable  •  {}",
        format::format_duration(summary.duration_secs).cyan(),
        format_size_colored(summary.total_size),
        format::format_count(summary.total_items).dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    for result in &summary.results {
        print_scan_result(result, detailed);
    }

    let errors: Vec<_> = summary.errors().collect();
    if !errors.is_empty() {
        println!(
            "  {} {}",
            "⚠".yellow(),
            format!("{} scanners failed:", errors.len()).yellow()
        );
        for (id, error) in errors {
            println!("    {} {}: {}", "→".dimmed(), id, error.dimmed());
        }
        println!();
    }

    if summary.total_items == 0 {
        println!("  {} Nothing to reclaim!", "✨");
        println!();
        return;
    }

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} Total reclaimable: {}",
        "💾",
        format_size_colored(summary.total_size)
    );
    println!(
        "  {} Run {} to clean",
        "💡",
        "reclaim clean --categories <ids>".cyan()
    );
    println!();
}

fn category_icon(id: CategoryId) -> &'static str {
    match id {
        CategoryId::BuildArtifacts => "🔧",
        CategoryId::Caches => "📁",
        CategoryId::Duplicates => "👯",
        CategoryId::LargeFiles => "📦",
        CategoryId::Logs => "📋",
        CategoryId::Trash => "🗑️",
    }
}

fn print_scan_result(result: &ScanResult, detailed: bool) {
    let Category { id, name, safety } = result.category;
    println!(
        "  {} {:<24} {:>10}  {:<8} {}",
        category_icon(id),
        name.bold(),
        format_size(result.total_size),
        format_safety(safety),
        format::format_count(result.items.len()).dimmed()
    );

    if detailed {
        for item in result.items.iter().take(20) {
            println!(
                "      {} {} ({})",
                "→".dimmed(),
                format::truncate(&item.name, 60),
                format_size(item.size).dimmed()
            );
            println!("        {}", format_path(&item.path).dimmed());
        }
        if result.items.len() > 20 {
            println!("      ... and {} more", result.items.len() - 20);
        }
    }
}

/// Print scan results as JSON
pub fn print_scan_json(summary: &ScanSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}

/// Print a minimal summary
pub fn print_scan_quiet(summary: &ScanSummary) {
    println!(
        "{}  {}  {}",
        format_size(summary.total_size),
        summary.total_items,
        summary.results.len()
    );
}

/// Print the category table
pub fn print_categories(categories: &[Category], ignored: &[CategoryId]) {
    println!();
    println!("  {} Scan Categories", "📋");
    println!("{}", "─".repeat(60).dimmed());
    for category in categories {
        let marker = if ignored.contains(&category.id) {
            "ignored".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {:<16} {:<22} {:<8} {}",
            category_icon(category.id),
            category.id.as_str().cyan(),
            category.name,
            format_safety(category.safety),
            marker
        );
    }
    println!();
}

/// Print a clean operation report
pub fn print_clean_report(report: &CleanReport) {
    println!();
    let (icon, label) = if report.dry_run {
        ("ℹ️", "Dry run")
    } else {
        ("🔥", "Removed")
    };

    println!(
        "  {} {} — {} items, {}",
        icon,
        label.bold(),
        report.cleaned_items.len().to_string().cyan(),
        format_size_colored(report.freed_space),
    );

    if report.dry_run {
        println!("  {} No files were modified.", "💡");
    }

    if !report.errors.is_empty() {
        println!();
        println!("  {} {} errors:", "⚠".yellow(), report.errors.len());
        for (i, err) in report.errors.iter().enumerate().take(10) {
            println!("    {} {}", format!("{}.", i + 1).dimmed(), err.dimmed());
        }
        if report.errors.len() > 10 {
            println!(
                "    ... and {} more",
                (report.errors.len() - 10).to_string().dimmed()
            );
        }
    }
    println!();
}

/// Print duplicate results in human-readable format
pub fn print_dup_results(report: &DuplicateReport, detailed: bool) {
    println!();
    println!("  {} reclaim Duplicate Scan", "👯");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned {} files in {}",
        report.files_scanned.to_string().cyan(),
        format::format_duration(report.duration_secs).cyan()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if report.groups.is_empty() {
        println!("  {} No duplicates found!", "✨");
        println!();
        return;
    }

    let items = report.items();
    for (i, group) in report.groups.iter().enumerate() {
        println!(
            "    Group {} — {} files, {} each",
            (i + 1).to_string().bold(),
            group.files.len(),
            format_size(group.file_size()),
        );

        if detailed {
            for file in &group.files {
                let is_copy = items.iter().any(|item| item.path == file.path);
                if is_copy {
                    println!("      {} {}", "  dup →".dimmed(), format_path(&file.path).dimmed());
                } else {
                    println!("      {} {}", "keep →".dimmed(), format_path(&file.path).green());
                }
            }
            println!();
        }
    }

    if !detailed {
        println!();
        println!("      Run with {} to see file paths", "--detailed".cyan());
        println!();
    }

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} {} duplicate groups, {} total wasted space",
        "💾",
        report.groups.len().to_string().cyan(),
        format_size_colored(report.wasted_bytes),
    );
    println!(
        "  {} {} duplicate files that could be removed",
        "📄",
        items.len().to_string().cyan(),
    );
    if !report.errors.is_empty() {
        println!(
            "  {} {} files could not be read",
            "⚠".yellow(),
            report.errors.len().to_string().yellow()
        );
    }
    println!();
}

/// Print duplicate results as JSON
pub fn print_dup_json(report: &DuplicateReport) {
    let json = serde_json::json!({
        "files_scanned": report.files_scanned,
        "duration_secs": report.duration_secs,
        "wasted_bytes": report.wasted_bytes,
        "groups": report.groups,
        "duplicates": report.items(),
        "errors": report.errors,
    });
    match serde_json::to_string_pretty(&json) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error serializing: {}", e),
    }
}
