use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use sitemend_core::audit::run_audit;
use sitemend_core::config::{CONFIG_FILE_NAME, SiteConfig};
use sitemend_core::report::{
    AuditReport, ReportFormat, generate_batch_report, generate_json_report, generate_text_report,
    save_report,
};
use sitemend_core::rewrite::{
    BatchOptions, BatchSummary, LinkMapping, Rewrite, load_mappings, rewrite_site,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Load the site config named by `--config`, or discover one under `--root`
/// (default: the current directory). An explicit `--root` wins over the
/// file's `site_root`.
pub fn load_site_config(args: &ArgMatches) -> Result<SiteConfig> {
    let root = args.get_one::<PathBuf>("root").map(|r| expand(r));

    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => {
            let path = expand(path);
            SiteConfig::load(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => {
            let dir = root.clone().unwrap_or_else(|| PathBuf::from("."));
            SiteConfig::discover(&dir)?
        }
    };

    if let Some(root) = root {
        config.site_root = root;
    }
    if !config.site_root.is_dir() {
        bail!("Site root {} is not a directory", config.site_root.display());
    }
    Ok(config)
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

/// Write the report to `--output` or stdout.
fn emit(content: &str, output: Option<&PathBuf>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            let path = expand(path);
            save_report(content, &path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn handle_audit(args: &ArgMatches, quiet: bool) -> Result<AuditReport> {
    let mut config = load_site_config(args)?;
    if let Some(origin) = args.get_one::<String>("origin") {
        config.origin = Some(origin.clone());
    }
    if let Some(sitemap) = args.get_one::<PathBuf>("sitemap") {
        config.sitemap = expand(sitemap);
    }

    let check_only = args.get_flag("check");
    let format = args
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let sitemap = config.sitemap_path();
    let report = run_audit(&mut config, check_only)
        .with_context(|| format!("Audit of {} failed", sitemap.display()))?;

    let content = match format {
        ReportFormat::Text => generate_text_report(&report),
        ReportFormat::Json => generate_json_report(&report)?,
    };
    emit(&content, args.get_one::<PathBuf>("output"), quiet)?;
    Ok(report)
}

fn run_rewrite(
    args: &ArgMatches,
    config: &SiteConfig,
    rewrite: Rewrite,
    quiet: bool,
) -> Result<BatchSummary> {
    let options = BatchOptions {
        dry_run: args.get_flag("dry-run"),
        show_progress: !quiet,
    };

    info!("{} under {}", rewrite.describe(), config.site_root.display());
    let summary = rewrite_site(config, &rewrite, &options)
        .with_context(|| format!("Failed to walk {}", config.site_root.display()))?;
    print!("{}", generate_batch_report(&summary));
    Ok(summary)
}

pub fn handle_bump_version(args: &ArgMatches, quiet: bool) -> Result<BatchSummary> {
    let asset = args
        .get_one::<String>("asset")
        .context("--asset is required")?;
    let version = *args
        .get_one::<u32>("version")
        .context("--version is required")?;
    let rewrite = Rewrite::asset_version(asset, version)?;
    run_rewrite(args, &load_site_config(args)?, rewrite, quiet)
}

pub fn handle_replace(args: &ArgMatches, quiet: bool) -> Result<BatchSummary> {
    let from = args.get_one::<String>("from").context("--from is required")?;
    let to = args.get_one::<String>("to").context("--to is required")?;
    let ignore_case = args.get_flag("ignore-case");
    let rewrite = if args.get_flag("regex") {
        Rewrite::pattern(from, to, ignore_case)?
    } else {
        Rewrite::literal(from, to, ignore_case)?
    };
    run_rewrite(args, &load_site_config(args)?, rewrite, quiet)
}

/// Collect `--map` pairs followed by `--map-file` lines.
pub fn collect_mappings(args: &ArgMatches) -> Result<Vec<LinkMapping>> {
    let mut mappings = Vec::new();
    if let Some(pairs) = args.get_many::<String>("map") {
        for pair in pairs {
            mappings.push(LinkMapping::parse(pair)?);
        }
    }
    if let Some(path) = args.get_one::<PathBuf>("map-file") {
        let path = expand(path);
        mappings.extend(
            load_mappings(&path)
                .with_context(|| format!("Failed to read mappings from {}", path.display()))?,
        );
    }
    if mappings.is_empty() {
        bail!("No link mappings given; use --map OLD=NEW or --map-file");
    }
    Ok(mappings)
}

pub fn handle_remap(args: &ArgMatches, quiet: bool) -> Result<BatchSummary> {
    let mappings = collect_mappings(args)?;
    let config = load_site_config(args)?;
    let rewrite = Rewrite::remap_links(
        mappings,
        config.all_origins(),
        config.origin().map(String::from),
    )?;
    run_rewrite(args, &config, rewrite, quiet)
}

pub fn handle_inject(args: &ArgMatches, quiet: bool) -> Result<BatchSummary> {
    let snippet_path = args
        .get_one::<PathBuf>("snippet-file")
        .map(|p| expand(p))
        .context("--snippet-file is required")?;
    let marker = args
        .get_one::<String>("marker")
        .context("--marker is required")?;
    let snippet = fs::read_to_string(&snippet_path)
        .with_context(|| format!("Failed to read snippet {}", snippet_path.display()))?;
    let rewrite = Rewrite::inject_head(&snippet, marker)?;
    run_rewrite(args, &load_site_config(args)?, rewrite, quiet)
}

/// Write a commented `sitemend.toml` into the target directory. Returns the
/// written path, or `None` when the user declines to overwrite.
pub fn handle_init(args: &ArgMatches, quiet: bool) -> Result<Option<PathBuf>> {
    let dir = args
        .get_one::<String>("DIR")
        .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
        .unwrap_or_else(|| PathBuf::from("."));
    let force = args.get_flag("force");
    let config_path = dir.join(CONFIG_FILE_NAME);

    if !quiet {
        print_divider();
        println!("{}", "  SITEMEND INITIALIZATION".bright_white().bold());
        print_divider();
        println!();
        println!(
            "{} Target: {}",
            "→".blue(),
            config_path.display().to_string().bright_white()
        );
        println!();
    }

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!(
            "{} already exists and will be overwritten.",
            config_path.display().to_string().bright_white()
        );

        let response = print_prompt("Do you want to continue? [y/N]:")?;
        println!();

        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(None);
        }
    }

    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(&config_path, SiteConfig::template())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!(
        "{} Wrote {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    if !quiet {
        println!(
            "{} Set {} and run {}",
            "→".blue(),
            "origin".bright_white(),
            "sitemend audit --check".bright_white()
        );
    }
    Ok(Some(config_path))
}
