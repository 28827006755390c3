mod canonical;
mod clean;
mod crawl;
mod dataset;
mod document;
mod fetch;
mod geo;
mod listing;
mod settings;
mod store;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::crawl::CrawlConfig;
use crate::fetch::HttpSource;
use crate::geo::Gazetteer;
use crate::settings::Settings;
use crate::store::RawRow;

#[derive(Parser)]
#[command(name = "immo_pipeline", about = "Real-estate listing scraper, cleaner and geo-joiner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl index pages and save validated listings as raw rows
    Crawl {
        /// Number of index pages to walk
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        /// Raw rows CSV to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Clean raw rows, attach coordinates and write the final dataset
    Clean {
        /// Raw rows CSV produced by `crawl`
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Gazetteer CSV with label, latitude, longitude columns
        #[arg(short, long)]
        gazetteer: Option<PathBuf>,
        /// Final dataset CSV to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Crawl + clean in one pipeline
    Run {
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        #[arg(short, long)]
        gazetteer: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the canonical join key of city names
    Key {
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Crawl { pages, output } => {
            let raw_path = output.unwrap_or_else(|| settings.raw_path.clone());
            let rows = crawl_to_raw(&settings.crawl_config(pages), &raw_path).await?;
            println!("Saved {} listings to {}", rows.len(), raw_path.display());
            Ok(())
        }
        Commands::Clean {
            input,
            gazetteer,
            output,
        } => {
            let raw_path = input.unwrap_or_else(|| settings.raw_path.clone());
            let rows = store::load_raw_rows(&raw_path)?;
            if rows.is_empty() {
                println!("No raw rows in {}. Run 'crawl' first.", raw_path.display());
                return Ok(());
            }
            build_dataset(&settings, &rows, gazetteer, output)
        }
        Commands::Run {
            pages,
            gazetteer,
            output,
        } => {
            let t_crawl = Instant::now();
            let rows = crawl_to_raw(&settings.crawl_config(pages), &settings.raw_path).await?;
            println!(
                "Crawled {} listings in {:.1}s",
                rows.len(),
                t_crawl.elapsed().as_secs_f64()
            );
            if rows.is_empty() {
                println!("Nothing to clean (no valid listings).");
                return Ok(());
            }
            build_dataset(&settings, &rows, gazetteer, output)
        }
        Commands::Key { names } => {
            for name in &names {
                println!("{}", name);
                for (step, value) in canonical::trace(name) {
                    println!("  {:<18} {}", step, value);
                }
                println!("  => {}", canonical::canonicalize(name));
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn crawl_to_raw(cfg: &CrawlConfig, raw_path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let source = HttpSource::new()?;
    let report = crawl::crawl(&source, cfg).await?;
    println!("{}", report.summary());

    let rows: Vec<RawRow> = report.listings.iter().map(|l| l.to_raw_row()).collect();
    store::save_raw_rows(raw_path, &rows)?;
    if !report.rejections.is_empty() {
        store::save_rejections(&store::rejections_path(raw_path), &report.rejections)?;
    }
    Ok(rows)
}

fn build_dataset(
    settings: &Settings,
    rows: &[RawRow],
    gazetteer: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let gazetteer_path = gazetteer.unwrap_or_else(|| settings.gazetteer_path.clone());
    let output_path = output.unwrap_or_else(|| settings.output_path.clone());

    let records = store::load_gazetteer(&gazetteer_path, settings.delimiter()?)?;
    let gazetteer = Gazetteer::new(&records);
    if gazetteer.is_empty() {
        warn!("Gazetteer {} is empty; no row will get coordinates", gazetteer_path.display());
    } else {
        info!("Gazetteer: {} distinct city keys", gazetteer.len());
    }

    let dataset = dataset::build(rows, &gazetteer);
    if dataset.is_empty() {
        warn!("Every row was dropped during cleaning");
    }
    store::save_dataset(&output_path, &dataset)?;

    println!(
        "Wrote {} rows ({} columns) to {}",
        dataset.len(),
        dataset.columns().len(),
        output_path.display()
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
