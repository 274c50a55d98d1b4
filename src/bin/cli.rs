//! Olist CLI - build the per-order training table from a CSV directory

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{CsvWriter, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use olist::data::{DataConfig, DataStore, DEFAULT_CSV_DIR};
use olist::order::{OrderFeatureBuilder, TrainingTable};

/// Environment variable consulted when `--data-dir` is not given
const CSV_DIR_ENV: &str = "OLIST_CSV_DIR";

#[derive(Parser)]
#[command(name = "olist")]
#[command(author, version, about = "Olist order feature builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the CSV extracts
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Filename prefix stripped from table names
    #[arg(long, default_value = "olist_")]
    prefix: String,

    /// Filename suffix stripped from table names
    #[arg(long, default_value = "_dataset.csv")]
    suffix: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded tables with their sizes
    Tables,

    /// Build the training table
    Features {
        /// Keep orders regardless of status (inference time)
        #[arg(long)]
        all_orders: bool,

        /// Join the seller-customer distance feature
        #[arg(long)]
        with_distance: bool,

        /// Write the table to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file format
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Number of rows to preview
        #[arg(long, default_value = "5")]
        head: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let csv_dir = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var(CSV_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_DIR));
    let config = DataConfig::new(&csv_dir)
        .with_prefix(&cli.prefix)
        .with_suffix(&cli.suffix);

    let store = load_store(&config)?;

    match cli.command {
        Commands::Tables => list_tables(&store)?,
        Commands::Features {
            all_orders,
            with_distance,
            output,
            format,
            head,
        } => {
            let table = build_features(&store, !all_orders, with_distance)?;
            print_preview(&table, head);
            if let Some(path) = output {
                write_table(&table, &path, format)?;
            }
        }
    }

    Ok(())
}

fn load_store(config: &DataConfig) -> Result<DataStore> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(format!("Loading CSV files from {:?}...", config.csv_dir));

    let store = DataStore::load(config)
        .with_context(|| format!("Failed to load CSV files from {:?}", config.csv_dir));

    pb.finish_and_clear();
    store
}

fn list_tables(store: &DataStore) -> Result<()> {
    println!("{:<40} {:>10} {:>8}", "Table", "Rows", "Columns");
    println!("{}", "-".repeat(60));

    for name in store.table_names() {
        let df = store.table(name)?;
        println!("{:<40} {:>10} {:>8}", name, df.height(), df.width());
    }

    println!();
    println!("Total: {} tables", store.len());
    Ok(())
}

fn build_features(store: &DataStore, is_delivered: bool, with_distance: bool) -> Result<TrainingTable> {
    println!(
        "{} (delivered only: {}, distance: {})",
        "Building training table".green(),
        is_delivered,
        with_distance
    );

    OrderFeatureBuilder::new(store)
        .training_data(is_delivered, with_distance)
        .context("Failed to build training table")
}

fn print_preview(table: &TrainingTable, head: usize) {
    println!();
    println!(
        "{} rows x {} columns",
        table.len().to_string().cyan().bold(),
        table.column_names().len()
    );

    if head == 0 {
        return;
    }

    println!(
        "{:<34} {:>8} {:>8} {:>7} {:>5} {:>5} {:>5} {:>9} {:>8} {:>9}",
        "order_id", "wait", "expected", "delay", "score", "prods", "sells", "price", "freight", "km"
    );
    println!("{}", "-".repeat(110));

    for row in table.iter().take(head) {
        let distance = row
            .distance_seller_customer
            .map(|d| format!("{:.1}", d))
            .unwrap_or_else(|| "-".to_string());
        let delay = format!("{:.2}", row.delay_vs_expected);
        let delay = if row.delay_vs_expected > 0.0 {
            delay.red().to_string()
        } else {
            delay
        };

        println!(
            "{:<34} {:>8.2} {:>8.2} {:>7} {:>5} {:>5} {:>5} {:>9.2} {:>8.2} {:>9}",
            row.order_id,
            row.wait_time,
            row.expected_wait_time,
            delay,
            row.review_score,
            row.number_of_products,
            row.number_of_sellers,
            row.price,
            row.freight_value,
            distance
        );
    }
}

fn write_table(table: &TrainingTable, path: &Path, format: OutputFormat) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;

    match format {
        OutputFormat::Csv => {
            let mut df = table
                .to_dataframe()
                .context("Failed to convert training table")?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .with_context(|| format!("Failed to write {:?}", path))?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut file, &table.rows)
                .with_context(|| format!("Failed to write {:?}", path))?;
        }
    }

    info!("Wrote {} rows to {:?}", table.len(), path);
    println!("{} {:?}", "Saved to".green(), path);
    Ok(())
}
