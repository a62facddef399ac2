use serde::{Deserialize, Serialize};

/// The nine canonical fields every pipeline stage agrees on, in the order
/// they appear in the standardized CSV header.
pub const STANDARD_FIELDS: [&str; 9] = [
    "movie_id",
    "title",
    "genres",
    "release_year",
    "runtime",
    "rating",
    "vote_count",
    "popularity",
    "overview",
];

/// Earliest plausible release year (the first commercial films).
pub const MIN_RELEASE_YEAR: i32 = 1888;

/// A standardized movie record as produced by extraction and column mapping.
///
/// Numeric fields stay `Option` so the transformer can tell "missing" apart
/// from a genuine zero when applying its fill rules. `genres` is always a
/// pipe-separated token list by the time a record carries this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default)]
    pub movie_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genres: String,
    pub release_year: Option<i32>,
    pub runtime: Option<i64>,
    pub rating: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
    #[serde(default)]
    pub overview: String,
}

/// A cleaned record with the six engineered feature columns attached.
///
/// Produced only by the transformer; the derived fields are recomputed on
/// every run and never flow back upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedMovie {
    pub movie_id: String,
    pub title: String,
    pub genres: String,
    pub release_year: i32,
    pub runtime: i64,
    pub rating: f64,
    pub vote_count: i64,
    pub popularity: f64,
    pub overview: String,
    pub movie_age: i32,
    pub rating_category: String,
    pub popularity_bucket: String,
    pub runtime_category: String,
    pub era: String,
    pub genre_count: usize,
    pub weighted_score: f64,
}

impl ProcessedMovie {
    /// Genre tokens in record order. Empty genres field yields no tokens.
    pub fn genre_tokens(&self) -> Vec<&str> {
        self.genres
            .split('|')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
