mod analysis;
mod charts;
mod collect;
mod config;
mod dataset;
mod github;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};
use tracing_subscriber::EnvFilter;

use charts::RenderSummary;
use config::Config;
use dataset::MetricsTable;

/// PR Insights: collects merged and closed pull requests of popular GitHub
/// repositories and charts how size, review time and interactions relate to
/// the final outcome.
#[derive(Parser, Debug)]
#[command(name = "pr-insights", version, about)]
struct Cli {
    /// Config file (defaults to .pr-insights.toml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query GitHub and write the pull request dataset
    Collect,
    /// Correlation and grouped-mean heatmaps from the dataset
    Heatmaps,
    /// Hexbin joint plots of metric pairs from the dataset
    Hexbins,
    /// Both heatmaps and hexbins
    Charts,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "could not load configuration");
            return;
        }
    };

    match cli.command {
        Command::Collect => collect(&config).await,
        Command::Heatmaps => heatmaps(&config),
        Command::Hexbins => hexbins(&config),
        Command::Charts => {
            heatmaps(&config);
            hexbins(&config);
        }
    }
}

async fn collect(config: &Config) {
    let _span = info_span!("collect").entered();

    let client = match github::GithubClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "cannot query GitHub");
            return;
        }
    };

    let collection = collect::run(&client, &config.collector).await;
    if collection.repositories.is_empty() {
        println!("{} No eligible repository was found; nothing was collected.", "!".yellow().bold());
        return;
    }
    if collection.records.is_empty() {
        println!("{} No pull request passed the eligibility filters.", "!".yellow().bold());
        return;
    }

    let output = &config.collector.output;
    match dataset::write_records(output, &collection.records) {
        Ok(()) => println!(
            "{} {} pull requests from {} repositories saved to {}",
            "✔".green().bold(),
            collection.records.len(),
            collection.repositories.len(),
            output.display()
        ),
        Err(e) => error!(path = %output.display(), error = %e, "failed to write dataset"),
    }
}

fn load_table(path: &Path) -> Option<MetricsTable> {
    match MetricsTable::from_path(path) {
        Ok(table) if table.is_empty() => {
            warn!(path = %path.display(), "dataset has no rows");
            None
        }
        Ok(table) => {
            info!(path = %path.display(), rows = table.len(), "dataset loaded");
            Some(table)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not read dataset");
            None
        }
    }
}

fn report(kind: &str, dir: &Path, summary: &RenderSummary) {
    for path in &summary.written {
        println!("{} {}", "✔".green().bold(), path.display());
    }
    for name in &summary.skipped {
        println!("{} {} skipped: too few complete observations", "!".yellow().bold(), name);
    }
    for name in &summary.failed {
        println!("{} {} could not be drawn", "✘".red().bold(), name);
    }
    println!(
        "{} {} {} saved in {}",
        "═══".bold(),
        summary.written.len(),
        kind,
        dir.display()
    );
}

fn heatmaps(config: &Config) {
    let _span = info_span!("heatmaps").entered();
    let Some(table) = load_table(&config.charts.input) else {
        return;
    };
    let dir = &config.charts.heatmap_dir;
    match charts::render_heatmaps(&table, dir) {
        Ok(summary) => report("heatmaps", dir, &summary),
        Err(e) => error!(dir = %dir.display(), error = %e, "heatmaps not rendered"),
    }
}

fn hexbins(config: &Config) {
    let _span = info_span!("hexbins").entered();
    let Some(table) = load_table(&config.charts.input) else {
        return;
    };
    let dir = &config.charts.hexbin_dir;
    match charts::render_hexbins(&table, dir) {
        Ok(summary) => report("hexbin plots", dir, &summary),
        Err(e) => error!(dir = %dir.display(), error = %e, "hexbins not rendered"),
    }
}
