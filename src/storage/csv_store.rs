use std::fs;
use std::path::Path;

use csv::Writer;
use tracing::info;

use crate::error::PipelineError;
use crate::models::{MovieRecord, ProcessedMovie, RawTable};
use crate::processor::ColumnMapper;

/// Write the standardized table. The header is exactly the nine standard
/// fields, in schema order.
pub fn write_standardized(
    path: &Path,
    records: &[MovieRecord],
) -> Result<(), PipelineError> {
    write_csv(path, records)?;
    info!("standardized data saved to {}", path.display());
    Ok(())
}

/// Write the processed table: standard fields plus the six derived columns.
pub fn write_processed(
    path: &Path,
    movies: &[ProcessedMovie],
) -> Result<(), PipelineError> {
    write_csv(path, movies)?;
    info!("processed data saved to {}", path.display());
    Ok(())
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a standardized CSV back into records.
///
/// Goes through the raw table and mapper instead of direct deserialization
/// so malformed numeric cells degrade to missing values rather than failing
/// the whole file. The header already carries the standard field names, so
/// resolution is the plain fuzzy identity mapping.
pub fn read_standardized(path: &Path) -> Result<Vec<MovieRecord>, PipelineError> {
    let table = RawTable::from_csv_path(path)?;
    let mapper = ColumnMapper::new();
    let mapping = mapper.resolve(&table, crate::processor::SourceProfile::Custom);
    Ok(mapper.apply(&table, &mapping))
}
