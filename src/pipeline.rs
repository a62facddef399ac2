use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::fetcher::MovieExtractor;
use crate::processor::Transformer;
use crate::report;
use crate::storage::{LoadSummary, SqliteLoader, csv_store};

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub extracted: usize,
    pub processed: usize,
    pub load: LoadSummary,
    pub duration: Duration,
}

/// Sequential extract -> transform -> load -> report run over one batch.
///
/// Each phase reads the previous phase's output and writes its own file, so
/// a run leaves a standardized CSV, a processed CSV, the SQLite database and
/// a text report behind.
pub struct EtlPipeline {
    config: PipelineConfig,
}

impl EtlPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        EtlPipeline { config }
    }

    pub async fn run(&self, source: &str, count: usize) -> Result<PipelineReport> {
        let started = Instant::now();
        info!("movie analytics ETL pipeline started (source: {source}, count: {count})");

        phase_banner("PHASE 1: EXTRACTION");
        let extractor = MovieExtractor::new(self.config.clone());
        let records = extractor
            .extract(source, count)
            .await
            .context("extraction phase failed")?;
        csv_store::write_standardized(&self.config.standardized_path(), &records)
            .context("could not write standardized CSV")?;
        info!("extracted {} records", records.len());

        phase_banner("PHASE 2: TRANSFORMATION");
        let transformer = Transformer::new();
        let processed = transformer.transform(&records);
        csv_store::write_processed(&self.config.processed_path(), &processed)
            .context("could not write processed CSV")?;
        info!("transformed {} records", processed.len());

        phase_banner("PHASE 3: LOADING");
        let loader = SqliteLoader::new(&self.config.data.database_path);
        let load = loader.load(&processed).context("load phase failed")?;

        phase_banner("PHASE 4: REPORTING");
        let stats = report::summarize(&processed);
        let report_path = self.config.data.processed_dir.join("data_summary.txt");
        report::write_report(&report_path, &stats)?;

        let pipeline_report = PipelineReport {
            extracted: records.len(),
            processed: processed.len(),
            load,
            duration: started.elapsed(),
        };

        self.write_pipeline_summary(&pipeline_report)?;

        info!(
            "pipeline completed in {:.2}s: {} extracted, {} processed, {} loaded",
            pipeline_report.duration.as_secs_f64(),
            pipeline_report.extracted,
            pipeline_report.processed,
            pipeline_report.load.movies
        );

        Ok(pipeline_report)
    }

    fn write_pipeline_summary(&self, report: &PipelineReport) -> Result<()> {
        let path = self.config.data.processed_dir.join("pipeline_summary.txt");
        let line = "=".repeat(78);

        let content = format!(
            "{line}\nETL PIPELINE EXECUTION SUMMARY\n{line}\n\n\
             Duration: {:.2} seconds\n\n\
             PHASES:\n  1. Extraction: {} records\n  2. Transformation: {} records\n  \
             3. Loading: {} movies, {} genres, {} links\n  4. Reporting: done\n\n\
             OUTPUT FILES:\n  - Standardized CSV: {}\n  - Processed CSV: {}\n  \
             - Database: {}\n  - Summary: {}\n{line}\n",
            report.duration.as_secs_f64(),
            report.extracted,
            report.processed,
            report.load.movies,
            report.load.genres,
            report.load.links,
            self.config.standardized_path().display(),
            self.config.processed_path().display(),
            self.config.data.database_path.display(),
            self.config.data.processed_dir.join("data_summary.txt").display(),
        );

        std::fs::create_dir_all(&self.config.data.processed_dir)?;
        std::fs::write(&path, content)?;
        info!("pipeline summary saved to {}", path.display());
        Ok(())
    }

    /// Re-run the full pipeline on a fixed interval until interrupted. The
    /// first run fires immediately.
    pub async fn run_scheduled(&self, source: &str, count: usize, every: Duration) -> Result<()> {
        let mut interval = tokio::time::interval(every);

        loop {
            interval.tick().await;
            info!("scheduled pipeline execution triggered");
            match self.run(source, count).await {
                Ok(report) => info!(
                    "scheduled run finished: {} movies loaded",
                    report.load.movies
                ),
                Err(e) => error!("scheduled run failed: {e:#}"),
            }
        }
    }
}

fn phase_banner(name: &str) {
    let line = "=".repeat(78);
    info!("{line}");
    info!("{name}");
    info!("{line}");
}
