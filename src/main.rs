use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use movie_pipeline::config::PipelineConfig;
use movie_pipeline::fetcher::MovieExtractor;
use movie_pipeline::models::RawTable;
use movie_pipeline::pipeline::EtlPipeline;
use movie_pipeline::processor::{ColumnMapper, MappingPreview, SourceProfile};
use movie_pipeline::storage::csv_store;

#[derive(Parser)]
#[command(
    name = "movie-pipeline",
    version,
    about = "Movie analytics ETL pipeline: extract, standardize, transform and load movie data"
)]
struct Cli {
    /// TOML configuration file; defaults are used when it does not exist.
    #[arg(long, global = true, default_value = "movie_pipeline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full extract -> transform -> load -> report pipeline
    Run {
        /// Extraction source: auto, sample, tmdb or wikipedia
        #[arg(long, default_value = "auto")]
        source: String,
        /// Desired record count (default from configuration)
        #[arg(long)]
        count: Option<usize>,
    },
    /// Extract and write the standardized CSV without the downstream phases
    Extract {
        #[arg(long, default_value = "auto")]
        source: String,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Standardize an arbitrary movie CSV into the pipeline schema
    Import {
        /// Input CSV file
        file: PathBuf,
        /// Source profile (imdb, tmdb, movielens, rotten-tomatoes,
        /// letterboxd, kaggle, custom); auto-detected when omitted
        #[arg(long)]
        source: Option<SourceProfile>,
        /// Explicit column mapping, repeatable: --map "Film Name=title"
        #[arg(long = "map", value_name = "COLUMN=FIELD")]
        mappings: Vec<String>,
        /// Output path; defaults to the configured standardized file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show how a file's columns would map to the standard schema
    Preview {
        file: PathBuf,
        #[arg(long)]
        source: Option<SourceProfile>,
    },
    /// Re-run the pipeline on a fixed interval
    Schedule {
        #[arg(long, default_value = "auto")]
        source: String,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long, default_value_t = 24)]
        every_hours: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = PipelineConfig::load_or_default(&cli.config)?;

    match cli.command {
        Command::Run { source, count } => {
            let count = count.unwrap_or(config.extraction.record_count);
            let pipeline = EtlPipeline::new(config);
            pipeline.run(&source, count).await?;
        }
        Command::Extract { source, count } => {
            let count = count.unwrap_or(config.extraction.record_count);
            let extractor = MovieExtractor::new(config.clone());
            let records = extractor.extract(&source, count).await?;
            csv_store::write_standardized(&config.standardized_path(), &records)?;
            info!("extracted {} records", records.len());
        }
        Command::Import {
            file,
            source,
            mappings,
            output,
        } => {
            let table = RawTable::from_csv_path(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            let mapper = ColumnMapper::new();

            let mapping = if mappings.is_empty() {
                let profile = source.unwrap_or_else(|| {
                    movie_pipeline::processor::detect_source(&table.headers)
                });
                info!("using mapping for source profile: {profile}");
                mapper.resolve(&table, profile)
            } else {
                let custom = parse_mapping_args(&mappings)?;
                info!("using custom column mapping ({} pairs)", custom.len());
                mapper.resolve_custom(&table, &custom)
            };

            let records = mapper.apply(&table, &mapping);
            let output = output.unwrap_or_else(|| config.standardized_path());
            csv_store::write_standardized(&output, &records)?;
            info!(
                "imported {} records from {} to {}",
                records.len(),
                file.display(),
                output.display()
            );
        }
        Command::Preview { file, source } => {
            let table = RawTable::from_csv_path(&file)
                .with_context(|| format!("could not read {}", file.display()))?;
            let preview = ColumnMapper::new().preview(&table, source);
            print_preview(&file, &table, &preview);
        }
        Command::Schedule {
            source,
            count,
            every_hours,
        } => {
            let count = count.unwrap_or(config.extraction.record_count);
            let every = Duration::from_secs(every_hours * 3600);
            info!("scheduling pipeline every {every_hours} hour(s)");
            let pipeline = EtlPipeline::new(config);
            pipeline.run_scheduled(&source, count, every).await?;
        }
    }

    Ok(())
}

/// Parse repeated `--map "Column=field"` arguments.
fn parse_mapping_args(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut mapping = HashMap::new();
    for pair in raw {
        let (column, field) = pair
            .split_once('=')
            .with_context(|| format!("invalid mapping `{pair}`, expected COLUMN=FIELD"))?;
        mapping.insert(column.trim().to_string(), field.trim().to_string());
    }
    Ok(mapping)
}

fn print_preview(file: &PathBuf, table: &RawTable, preview: &MappingPreview) {
    let line = "=".repeat(78);
    println!("{line}");
    println!("DATA SOURCE MAPPING REPORT");
    println!("{line}");
    println!("File:            {}", file.display());
    println!("Detected source: {}", preview.profile);
    println!("Total columns:   {}", table.headers.len());
    println!("Total rows:      {}", table.len());
    println!();
    println!("COLUMN MAPPINGS:");
    for entry in &preview.entries {
        println!(
            "  {:<30} -> {:<14} (sample: {})",
            entry.source_column, entry.target_field, entry.sample
        );
    }

    if !preview.unmapped_columns.is_empty() {
        println!();
        println!("UNMAPPED COLUMNS (will be dropped):");
        for column in &preview.unmapped_columns {
            println!("  {column}");
        }
    }

    if !preview.missing_fields.is_empty() {
        println!();
        println!("STANDARD FIELDS WITH NO SOURCE COLUMN (will be left empty):");
        for field in &preview.missing_fields {
            println!("  {field}");
        }
    }

    println!("{line}");
}
