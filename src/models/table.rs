use std::path::Path;

use csv::ReaderBuilder;

use crate::error::PipelineError;

/// An untyped table as it arrives from an arbitrary source file: a header
/// row plus string cells. This is what the source detector and column mapper
/// operate on before anything is coerced into the standard schema.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    /// Read a CSV file into a raw table. `flexible` tolerates rows with a
    /// varying cell count; short rows are padded to the header width.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// First non-empty value in a column, for mapping previews.
    pub fn sample_value(&self, column: usize) -> Option<&str> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .map(|cell| cell.trim())
            .find(|cell| !cell.is_empty())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index_case_insensitive() {
        let table = RawTable::new(
            vec!["Title".to_string(), "Year".to_string()],
            vec![vec!["Heat".to_string(), "1995".to_string()]],
        );

        assert_eq!(table.column_index("title"), Some(0));
        assert_eq!(table.column_index("YEAR"), Some(1));
        assert_eq!(table.column_index("rating"), None);
    }

    #[test]
    fn test_sample_value_skips_empty_cells() {
        let table = RawTable::new(
            vec!["title".to_string()],
            vec![
                vec!["".to_string()],
                vec!["  ".to_string()],
                vec!["Alien".to_string()],
            ],
        );

        assert_eq!(table.sample_value(0), Some("Alien"));
    }
}
