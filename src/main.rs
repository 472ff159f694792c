use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use reclaim::cli::args::{Cli, Commands, OutputFormat};
use reclaim::cli::output;
use reclaim::common::config::Config;
use reclaim::common::format;
use reclaim::common::CancelToken;
use reclaim::duplicates::{self, DuplicateDetector};
use reclaim::scanner::filter::PermissionFilter;
use reclaim::scanner::types::CategoryId;
use reclaim::scanner::walker;
use reclaim::scanner::{Orchestrator, RunOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _guard = init_logging(&cli)?;

    match cli.command {
        Commands::Scan {
            ref categories,
            sequential,
            concurrency,
            detailed,
        } => cmd_scan(&cli, categories.as_deref(), sequential, concurrency, detailed),

        Commands::Dup {
            ref paths,
            min_size,
            max_depth,
            detailed,
        } => cmd_dup(&cli, paths, min_size, max_depth, detailed),

        Commands::Clean {
            ref categories,
            dry_run,
            yes,
        } => cmd_clean(&cli, categories, dry_run, yes),

        Commands::Categories => cmd_categories(&cli),

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(
                clap_complete::Shell::from(shell),
                &mut cmd,
                "reclaim",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

// ─── Logging ──────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let filter = if cli.verbose {
        EnvFilter::new("reclaim=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reclaim=warn"))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = if cli.log_file {
        let dir = Config::logs_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log dir: {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(&dir, "reclaim.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn run_options(config: &Config, sequential: bool, concurrency: Option<usize>, progress: Option<ProgressBar>) -> RunOptions {
    let mut options = RunOptions {
        parallel: config.parallel && !sequential,
        concurrency: concurrency.unwrap_or(config.concurrency),
        on_progress: None,
        cancel: CancelToken::new(),
    };
    if let Some(pb) = progress {
        options = options.on_progress(move |p| {
            pb.set_length(p.total as u64);
            pb.set_position(p.completed as u64);
            pb.set_message(format!("{} done", p.category));
            if p.completed == p.total {
                pb.finish_and_clear();
            }
        });
    }
    options
}

fn make_progress(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("━━░"));
    }
    pb.set_message("Scanning...");
    Some(pb)
}

fn cmd_scan(
    cli: &Cli,
    categories: Option<&[String]>,
    sequential: bool,
    concurrency: Option<usize>,
    detailed: bool,
) -> Result<()> {
    let config = Config::load()?;
    let orchestrator = Orchestrator::from_config(&config);
    let show_progress = !cli.quiet && cli.format == OutputFormat::Human;
    let options = run_options(&config, sequential, concurrency, make_progress(show_progress));

    let summary = match categories {
        Some(ids) => orchestrator.run_scans(ids, options)?,
        None => orchestrator.run_all_scans(options)?,
    };

    match cli.format {
        OutputFormat::Human => output::print_scan_results(&summary, detailed),
        OutputFormat::Json => output::print_scan_json(&summary),
        OutputFormat::Quiet => output::print_scan_quiet(&summary),
    }

    Ok(())
}

// ─── Dup ──────────────────────────────────────────────────────────────────────

fn cmd_dup(
    cli: &Cli,
    paths: &[String],
    min_size: Option<u64>,
    max_depth: Option<usize>,
    detailed: bool,
) -> Result<()> {
    let config = Config::load()?;
    let roots = if paths.is_empty() {
        duplicates::default_roots()
            .into_iter()
            .filter(|r| r.exists())
            .collect()
    } else {
        walker::expand_paths(paths)
    };

    if let Some(missing) = roots.iter().find(|r| !r.exists()) {
        anyhow::bail!("Path does not exist: {}", missing.display());
    }

    let show_progress = !cli.quiet && cli.format == OutputFormat::Human;
    if show_progress {
        println!();
        for root in &roots {
            println!(
                "  {} Scanning for duplicates in: {}",
                "🔍",
                format::format_path(root).cyan()
            );
        }
        println!();
    }

    let report = DuplicateDetector::new(roots)
        .min_size(min_size.unwrap_or(config.duplicate_min_size_bytes()))
        .max_depth(max_depth.unwrap_or(config.duplicate_max_depth))
        .exclude(walker::expand_paths(&config.ignored_folders))
        .show_progress(show_progress)
        .find_groups(&CancelToken::new())?
        .filtered(&config.filter_config(), &PermissionFilter::default());

    match cli.format {
        OutputFormat::Human => output::print_dup_results(&report, detailed),
        OutputFormat::Json => output::print_dup_json(&report),
        OutputFormat::Quiet => {
            println!(
                "{}  {}  {}",
                report.groups.len(),
                report.items().len(),
                format::format_size(report.wasted_bytes)
            );
        }
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(cli: &Cli, categories: &[String], dry_run: bool, yes: bool) -> Result<()> {
    let config = Config::load()?;
    let orchestrator = Orchestrator::from_config(&config);
    let show_progress = !cli.quiet && cli.format == OutputFormat::Human;
    let options = run_options(&config, false, None, make_progress(show_progress));

    let summary = orchestrator.run_scans(categories, options)?;

    if summary.total_items == 0 {
        if cli.format == OutputFormat::Human {
            println!("  {} Nothing to clean!", "✨");
        }
        return Ok(());
    }

    if cli.format == OutputFormat::Human {
        output::print_scan_results(&summary, false);
    }

    if !dry_run && !yes {
        print!(
            "\n  {} PERMANENTLY DELETE {} ({})? [y/N] ",
            "❓",
            format::format_count(summary.total_items),
            format::format_size(summary.total_size)
        );
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("  {} Cancelled", "✗".red());
            return Ok(());
        }
    }

    let report = orchestrator.clean_results(&summary.results, dry_run);

    match cli.format {
        OutputFormat::Human => output::print_clean_report(&report),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "dry_run": report.dry_run,
                "cleaned": report.cleaned_items.len(),
                "freed_space": report.freed_space,
                "failed": report.failed,
                "errors": report.errors,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Quiet => {
            println!(
                "{}  {}  {}",
                format::format_size(report.freed_space),
                report.cleaned_items.len(),
                report.failed
            );
        }
    }

    Ok(())
}

// ─── Categories ───────────────────────────────────────────────────────────────

fn cmd_categories(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let orchestrator = Orchestrator::from_config(&config);
    let registry = orchestrator.registry();

    let categories: Vec<_> = registry
        .ids()
        .into_iter()
        .filter_map(|id| registry.get(id).map(|s| s.category()))
        .collect();
    let ignored: Vec<CategoryId> = categories
        .iter()
        .map(|c| c.id)
        .filter(|id| orchestrator.filter().is_category_ignored(*id))
        .collect();

    match cli.format {
        OutputFormat::Human => output::print_categories(&categories, &ignored),
        OutputFormat::Json => {
            let json: Vec<_> = categories
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.id,
                        "name": c.name,
                        "safety": c.safety,
                        "ignored": ignored.contains(&c.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Quiet => {
            for c in &categories {
                println!("{}", c.id);
            }
        }
    }

    Ok(())
}
