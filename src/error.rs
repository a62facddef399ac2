use thiserror::Error;

/// Errors surfaced by the pipeline stages.
///
/// `FetchFailure` is always recovered locally: the extraction chain catches it
/// and advances to the next provider, so it never reaches the caller of
/// `MovieExtractor::extract`. `SchemaViolation` is fatal for a load run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch from {source} failed: {reason}")]
    FetchFailure { source: String, reason: String },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl PipelineError {
    pub fn fetch(source: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::FetchFailure {
            source: source.into(),
            reason: reason.to_string(),
        }
    }
}
