use std::fmt;
use std::str::FromStr;

/// A known movie-data source with a predefined column mapping.
///
/// `Custom` means no profile signature matched; mapping then falls through to
/// fuzzy column-name matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceProfile {
    Imdb,
    Tmdb,
    MovieLens,
    RottenTomatoes,
    Letterboxd,
    Kaggle,
    Custom,
}

impl SourceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceProfile::Imdb => "imdb",
            SourceProfile::Tmdb => "tmdb",
            SourceProfile::MovieLens => "movielens",
            SourceProfile::RottenTomatoes => "rotten-tomatoes",
            SourceProfile::Letterboxd => "letterboxd",
            SourceProfile::Kaggle => "kaggle",
            SourceProfile::Custom => "custom",
        }
    }
}

impl fmt::Display for SourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "imdb" => Ok(SourceProfile::Imdb),
            "tmdb" => Ok(SourceProfile::Tmdb),
            "movielens" => Ok(SourceProfile::MovieLens),
            "rotten-tomatoes" => Ok(SourceProfile::RottenTomatoes),
            "letterboxd" => Ok(SourceProfile::Letterboxd),
            "kaggle" => Ok(SourceProfile::Kaggle),
            "custom" => Ok(SourceProfile::Custom),
            other => Err(format!("unknown source profile: {other}")),
        }
    }
}

/// Signature columns per profile. Detection picks the profile with the
/// greatest overlap against the input header; the order of this table is the
/// fixed tie-break priority.
const SOURCE_SIGNATURES: &[(SourceProfile, &[&str])] = &[
    (SourceProfile::Imdb, &["tconst", "primary_title", "start_year"]),
    (SourceProfile::Tmdb, &["id", "vote_average", "vote_count"]),
    (SourceProfile::MovieLens, &["movieid", "userid", "timestamp"]),
    (SourceProfile::RottenTomatoes, &["audience_score", "critics_score"]),
    (SourceProfile::Letterboxd, &["imdb_code", "imdb_id"]),
    (SourceProfile::Kaggle, &["film_name", "movie_name", "name"]),
];

/// Per-profile source-column -> standard-field mappings, kept as data so a
/// new profile is an added row, not a new code path.
const PROFILE_MAPPINGS: &[(SourceProfile, &[(&str, &str)])] = &[
    (
        SourceProfile::Tmdb,
        &[
            ("id", "movie_id"),
            ("title", "title"),
            ("genres", "genres"),
            ("release_date", "release_year"),
            ("runtime", "runtime"),
            ("vote_average", "rating"),
            ("vote_count", "vote_count"),
            ("popularity", "popularity"),
            ("overview", "overview"),
        ],
    ),
    (
        SourceProfile::Imdb,
        &[
            ("tconst", "movie_id"),
            ("title_id", "movie_id"),
            ("primary_title", "title"),
            ("original_title", "title"),
            ("genres", "genres"),
            ("start_year", "release_year"),
            ("runtime_minutes", "runtime"),
            ("average_rating", "rating"),
            ("num_votes", "vote_count"),
        ],
    ),
    (
        SourceProfile::MovieLens,
        &[
            ("movieid", "movie_id"),
            ("movie_id", "movie_id"),
            ("title", "title"),
            ("genres", "genres"),
            ("rating", "rating"),
        ],
    ),
    (
        SourceProfile::RottenTomatoes,
        &[
            ("id", "movie_id"),
            ("name", "title"),
            ("title", "title"),
            ("genre", "genres"),
            ("genres", "genres"),
            ("year", "release_year"),
            ("rating", "rating"),
            ("audience_score", "rating"),
            ("imdb_rating", "rating"),
        ],
    ),
    (
        SourceProfile::Letterboxd,
        &[
            ("id", "movie_id"),
            ("name", "title"),
            ("year", "release_year"),
            ("genre", "genres"),
            ("rating", "rating"),
            ("rating_count", "vote_count"),
            ("description", "overview"),
        ],
    ),
    (
        SourceProfile::Kaggle,
        &[
            ("movie_id", "movie_id"),
            ("film_name", "title"),
            ("movie_name", "title"),
            ("name", "title"),
            ("genre", "genres"),
            ("release_year", "release_year"),
            ("year", "release_year"),
            ("rating", "rating"),
            ("votes", "vote_count"),
            ("runtime", "runtime"),
        ],
    ),
];

/// Synonyms for fuzzy matching an unrecognized column name to a standard
/// field. Iterated in this order; `movie_id` comes last so short id-like
/// substrings cannot steal columns that belong to other fields.
const FUZZY_PATTERNS: &[(&str, &[&str])] = &[
    (
        "title",
        &["title", "name", "film_name", "movie_name", "primary_title", "original_title"],
    ),
    ("genres", &["genre", "genres", "genre_list", "category"]),
    (
        "release_year",
        &["year", "release_year", "release_date", "start_year"],
    ),
    (
        "runtime",
        &["runtime", "duration", "length", "running_time", "runtime_minutes"],
    ),
    (
        "rating",
        &["rating", "score", "imdb_rating", "average_rating", "audience_score", "vote_average"],
    ),
    (
        "vote_count",
        &["votes", "vote_count", "num_votes", "number_of_votes", "rating_count"],
    ),
    ("popularity", &["popularity", "popular"]),
    (
        "overview",
        &["overview", "description", "synopsis", "summary", "plot"],
    ),
    ("movie_id", &["movie_id", "tconst", "imdb_id", "film_id", "id"]),
];

/// Detect which source profile an incoming header belongs to.
///
/// Pure and deterministic: the same column-name set always yields the same
/// profile. Zero signature overlap yields `Custom`.
pub fn detect_source(headers: &[String]) -> SourceProfile {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    let mut best = SourceProfile::Custom;
    let mut best_score = 0usize;

    for &(profile, signature) in SOURCE_SIGNATURES {
        let score = signature
            .iter()
            .filter(|&&col| lowered.iter().any(|h| h.as_str() == col))
            .count();
        // Strictly greater keeps the first profile in table order on ties.
        if score > best_score {
            best_score = score;
            best = profile;
        }
    }

    best
}

/// The predefined mapping table for a profile. `Custom` has none.
pub fn profile_mapping(profile: SourceProfile) -> &'static [(&'static str, &'static str)] {
    PROFILE_MAPPINGS
        .iter()
        .find(|(p, _)| *p == profile)
        .map(|(_, mapping)| *mapping)
        .unwrap_or(&[])
}

/// Fuzzy-match a single input column name to a standard field.
///
/// Exact (separator-blind, case-insensitive) synonym matches win over
/// substring matches so that, e.g., `rating_count` lands on `vote_count`
/// rather than `rating`.
pub fn fuzzy_target(column: &str) -> Option<&'static str> {
    let normalized = normalize_column_name(column);
    if normalized.is_empty() {
        return None;
    }

    for &(field, synonyms) in FUZZY_PATTERNS {
        if normalized == normalize_column_name(field) {
            return Some(field);
        }
        if synonyms
            .iter()
            .any(|syn| normalize_column_name(syn) == normalized)
        {
            return Some(field);
        }
    }

    for &(field, synonyms) in FUZZY_PATTERNS {
        for syn in synonyms {
            let syn = normalize_column_name(syn);
            if normalized.contains(&syn) || syn.contains(&normalized) {
                return Some(field);
            }
        }
    }

    None
}

fn normalize_column_name(name: &str) -> String {
    name.to_lowercase()
        .replace('_', "")
        .replace('-', "")
        .replace(' ', "")
}
