use std::collections::HashMap;

use chrono::{Datelike, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{MIN_RELEASE_YEAR, MovieRecord, RawTable, STANDARD_FIELDS};
use crate::processor::source_detector::{
    SourceProfile, detect_source, fuzzy_target, profile_mapping,
};

/// A mapping from input columns to standard fields, resolved against a
/// concrete header. Pairs are kept in header order; when two input columns
/// target the same standard field the later column wins (last-applied-wins,
/// plain overwrite semantics).
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub profile: SourceProfile,
    pub pairs: Vec<(usize, &'static str)>,
}

impl ResolvedMapping {
    pub fn target_fields(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(_, field)| *field).collect()
    }

    /// Standard fields no input column maps to. These are filled with
    /// defaults instead of failing the load.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        STANDARD_FIELDS
            .iter()
            .copied()
            .filter(|field| !self.pairs.iter().any(|(_, f)| f == field))
            .collect()
    }
}

/// One line of a mapping preview: where a source column lands and what its
/// data looks like, so an operator can verify the mapping before a load.
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub source_column: String,
    pub target_field: &'static str,
    pub sample: String,
}

#[derive(Debug, Clone)]
pub struct MappingPreview {
    pub profile: SourceProfile,
    pub entries: Vec<PreviewEntry>,
    pub unmapped_columns: Vec<String>,
    pub missing_fields: Vec<&'static str>,
}

/// Renames and coerces arbitrary source tables into the standard schema.
pub struct ColumnMapper {
    current_year: i32,
    year_prefix: Regex,
}

impl ColumnMapper {
    pub fn new() -> Self {
        Self::with_current_year(Utc::now().year())
    }

    pub fn with_current_year(current_year: i32) -> Self {
        ColumnMapper {
            current_year,
            year_prefix: Regex::new(r"^(\d{4})").unwrap(),
        }
    }

    /// Detect the table's source and map it to the standard schema in one
    /// step.
    pub fn standardize(&self, table: &RawTable) -> Vec<MovieRecord> {
        let profile = detect_source(&table.headers);
        let mapping = self.resolve(table, profile);
        self.apply(table, &mapping)
    }

    /// Resolve the mapping for a detected or caller-chosen profile.
    ///
    /// Profile pairs are matched first; standard fields the profile leaves
    /// uncovered fall through to fuzzy matching, exactly once per field.
    pub fn resolve(&self, table: &RawTable, profile: SourceProfile) -> ResolvedMapping {
        let mut by_column: HashMap<usize, &'static str> = HashMap::new();

        for &(source_col, std_field) in profile_mapping(profile) {
            if let Some(index) = table.column_index(source_col) {
                by_column.insert(index, std_field);
            }
        }

        for field in STANDARD_FIELDS {
            let already_mapped = by_column.values().any(|f| *f == field);
            if already_mapped {
                continue;
            }
            for (index, header) in table.headers.iter().enumerate() {
                if by_column.contains_key(&index) {
                    continue;
                }
                if fuzzy_target(header) == Some(field) {
                    debug!("fuzzy matched column `{}` -> {}", header, field);
                    by_column.insert(index, field);
                    break;
                }
            }
        }

        let mut pairs: Vec<(usize, &'static str)> = by_column.into_iter().collect();
        pairs.sort_by_key(|(index, _)| *index);

        ResolvedMapping { profile, pairs }
    }

    /// Resolve an explicit caller-supplied mapping of input-column name to
    /// standard-field name. Unknown target fields are dropped with a warning.
    pub fn resolve_custom(
        &self,
        table: &RawTable,
        custom: &HashMap<String, String>,
    ) -> ResolvedMapping {
        let mut pairs = Vec::new();

        for (index, header) in table.headers.iter().enumerate() {
            let target = custom
                .iter()
                .find(|(source, _)| source.eq_ignore_ascii_case(header))
                .map(|(_, target)| target.as_str());

            let Some(target) = target else { continue };

            match STANDARD_FIELDS
                .iter()
                .find(|f| f.eq_ignore_ascii_case(target))
            {
                Some(field) => pairs.push((index, *field)),
                None => warn!(
                    "custom mapping `{}` -> `{}` ignored: not a standard field",
                    header, target
                ),
            }
        }

        ResolvedMapping {
            profile: SourceProfile::Custom,
            pairs,
        }
    }

    /// Apply a resolved mapping, producing records with exactly the standard
    /// fields. Unmapped input columns are dropped; absent target fields stay
    /// at their defaults (empty string / missing numeric). Malformed numeric
    /// cells are treated as missing, never as an error.
    pub fn apply(&self, table: &RawTable, mapping: &ResolvedMapping) -> Vec<MovieRecord> {
        let mut records = Vec::with_capacity(table.rows.len());

        for row in &table.rows {
            let mut record = MovieRecord::default();

            for (index, field) in &mapping.pairs {
                let Some(value) = row.get(*index) else { continue };
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                self.assign_field(&mut record, field, value);
            }

            records.push(record);
        }

        // Generate ids for records that arrived without one.
        for (i, record) in records.iter_mut().enumerate() {
            if record.movie_id.is_empty() {
                record.movie_id = format!("MOV{:05}", i + 1);
            }
        }

        records
    }

    fn assign_field(&self, record: &mut MovieRecord, field: &str, value: &str) {
        match field {
            "movie_id" => record.movie_id = value.to_string(),
            "title" => record.title = value.to_string(),
            "genres" => record.genres = normalize_genres(value),
            "release_year" => record.release_year = self.parse_year(value),
            "runtime" => record.runtime = parse_integer(value).filter(|v| *v >= 0),
            "rating" => record.rating = parse_float(value).filter(|v| (0.0..=10.0).contains(v)),
            "vote_count" => record.vote_count = parse_integer(value).filter(|v| *v >= 0),
            "popularity" => record.popularity = parse_float(value),
            "overview" => record.overview = value.to_string(),
            _ => {}
        }
    }

    /// Accepts a bare year or a date string with a leading year
    /// (e.g. "2010-07-16"). Values outside the plausible range are missing.
    fn parse_year(&self, value: &str) -> Option<i32> {
        let year = value
            .parse::<i32>()
            .ok()
            .or_else(|| {
                self.year_prefix
                    .captures(value)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<i32>().ok())
            })?;

        (MIN_RELEASE_YEAR..=self.current_year).contains(&year).then_some(year)
    }

    /// Preview how a table would be mapped without committing to a load.
    pub fn preview(&self, table: &RawTable, source: Option<SourceProfile>) -> MappingPreview {
        let profile = source.unwrap_or_else(|| detect_source(&table.headers));
        let mapping = self.resolve(table, profile);

        let entries = mapping
            .pairs
            .iter()
            .map(|&(index, field)| PreviewEntry {
                source_column: table.headers[index].clone(),
                target_field: field,
                sample: table
                    .sample_value(index)
                    .unwrap_or("N/A")
                    .chars()
                    .take(40)
                    .collect(),
            })
            .collect();

        let unmapped_columns = table
            .headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !mapping.pairs.iter().any(|(i, _)| i == index))
            .map(|(_, header)| header.clone())
            .collect();

        let missing_fields = mapping.missing_fields();
        for field in &missing_fields {
            warn!("no source column maps to `{}`; it will be left empty", field);
        }

        MappingPreview {
            profile,
            entries,
            unmapped_columns,
            missing_fields,
        }
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize genre lists to pipe-separated tokens: strips list-literal
/// brackets and quotes, splits on common delimiters, preserves token order
/// without deduplication.
pub fn normalize_genres(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
        .collect();

    stripped
        .split(['|', ',', ';', '/'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join("|")
}

fn parse_integer(value: &str) -> Option<i64> {
    let cleaned = value.replace(',', "");
    let cleaned = cleaned.trim();
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().map(|f| f as i64))
}

fn parse_float(value: &str) -> Option<f64> {
    value.replace(',', "").trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_table() -> RawTable {
        RawTable::new(
            vec![
                "Film Name".to_string(),
                "Release Year".to_string(),
                "IMDb Rating".to_string(),
                "Genre List".to_string(),
                "Runtime Minutes".to_string(),
                "Vote Count".to_string(),
            ],
            vec![vec![
                "Inception".to_string(),
                "2010".to_string(),
                "8.8".to_string(),
                "Action|Sci-Fi".to_string(),
                "148".to_string(),
                "2000000".to_string(),
            ]],
        )
    }

    fn custom_mapping() -> HashMap<String, String> {
        [
            ("Film Name", "title"),
            ("Release Year", "release_year"),
            ("IMDb Rating", "rating"),
            ("Genre List", "genres"),
            ("Runtime Minutes", "runtime"),
            ("Vote Count", "vote_count"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
    }

    #[test]
    fn test_custom_mapping_standardizes_row() {
        let table = custom_table();
        let mapper = ColumnMapper::with_current_year(2026);
        let mapping = mapper.resolve_custom(&table, &custom_mapping());
        let records = mapper.apply(&table, &mapping);

        assert_eq!(records.len(), 1);
        let movie = &records[0];
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.release_year, Some(2010));
        assert_eq!(movie.rating, Some(8.8));
        assert_eq!(movie.genres, "Action|Sci-Fi");
        assert_eq!(movie.runtime, Some(148));
        assert_eq!(movie.vote_count, Some(2_000_000));
        // Generated because the input had no id column.
        assert_eq!(movie.movie_id, "MOV00001");
    }

    #[test]
    fn test_fuzzy_resolution_covers_custom_headers() {
        let table = custom_table();
        let mapper = ColumnMapper::with_current_year(2026);
        let mapping = mapper.resolve(&table, SourceProfile::Custom);

        let targets = mapping.target_fields();
        for field in ["title", "release_year", "rating", "genres", "runtime", "vote_count"] {
            assert!(targets.contains(&field), "missing fuzzy target {field}");
        }
    }

    #[test]
    fn test_output_always_carries_standard_fields() {
        // Completely unrelated columns: every standard field falls back to
        // its default, and the record still has the full standard shape.
        let table = RawTable::new(
            vec!["color".to_string(), "weight".to_string()],
            vec![vec!["red".to_string(), "12".to_string()]],
        );
        let mapper = ColumnMapper::with_current_year(2026);
        let records = mapper.standardize(&table);

        assert_eq!(records.len(), 1);
        let movie = &records[0];
        assert_eq!(movie.title, "");
        assert_eq!(movie.genres, "");
        assert_eq!(movie.release_year, None);
        assert_eq!(movie.movie_id, "MOV00001");
    }

    #[test]
    fn test_last_mapped_column_wins() {
        let table = RawTable::new(
            vec!["name".to_string(), "film_name".to_string()],
            vec![vec!["First".to_string(), "Second".to_string()]],
        );
        let mapper = ColumnMapper::with_current_year(2026);
        let custom: HashMap<String, String> = [
            ("name".to_string(), "title".to_string()),
            ("film_name".to_string(), "title".to_string()),
        ]
        .into_iter()
        .collect();

        let mapping = mapper.resolve_custom(&table, &custom);
        let records = mapper.apply(&table, &mapping);
        assert_eq!(records[0].title, "Second");
    }

    #[test]
    fn test_genre_normalization_variants() {
        assert_eq!(normalize_genres("Action|Sci-Fi"), "Action|Sci-Fi");
        assert_eq!(normalize_genres("Action, Drama"), "Action|Drama");
        assert_eq!(normalize_genres("['Action', 'Drama']"), "Action|Drama");
        assert_eq!(normalize_genres("Crime; Thriller"), "Crime|Thriller");
        // Order preserved, duplicates kept.
        assert_eq!(normalize_genres("Drama, Action, Drama"), "Drama|Action|Drama");
    }

    #[test]
    fn test_malformed_numerics_become_missing() {
        let table = RawTable::new(
            vec!["title".to_string(), "year".to_string(), "rating".to_string()],
            vec![vec![
                "Broken".to_string(),
                "not-a-year".to_string(),
                "n/a".to_string(),
            ]],
        );
        let mapper = ColumnMapper::with_current_year(2026);
        let records = mapper.standardize(&table);

        assert_eq!(records[0].title, "Broken");
        assert_eq!(records[0].release_year, None);
        assert_eq!(records[0].rating, None);
    }

    #[test]
    fn test_release_date_yields_year() {
        let mapper = ColumnMapper::with_current_year(2026);
        assert_eq!(mapper.parse_year("2010-07-16"), Some(2010));
        assert_eq!(mapper.parse_year("1899"), Some(1899));
        // Implausible years are treated as missing.
        assert_eq!(mapper.parse_year("1600"), None);
        assert_eq!(mapper.parse_year("3024"), None);
    }

    #[test]
    fn test_preview_reports_missing_and_unmapped() {
        let table = RawTable::new(
            vec!["title".to_string(), "shelf_position".to_string()],
            vec![vec!["Dune".to_string(), "A4".to_string()]],
        );
        let mapper = ColumnMapper::with_current_year(2026);
        let preview = mapper.preview(&table, None);

        assert!(preview.entries.iter().any(|e| e.target_field == "title"));
        assert!(preview
            .unmapped_columns
            .contains(&"shelf_position".to_string()));
        assert!(preview.missing_fields.contains(&"rating"));
    }
}
