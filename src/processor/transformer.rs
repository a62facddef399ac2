use std::collections::HashSet;

use chrono::{Datelike, Utc};
use tracing::info;

use crate::models::{MovieRecord, ProcessedMovie};

/// Rating category cutoffs, inclusive lower bounds.
const RATING_EXCELLENT: f64 = 8.5;
const RATING_GOOD: f64 = 7.0;
const RATING_AVERAGE: f64 = 5.0;

/// Popularity bucket cutoffs, exclusive upper bounds.
const POPULARITY_MEDIUM: f64 = 20.0;
const POPULARITY_HIGH: f64 = 50.0;
const POPULARITY_VERY_HIGH: f64 = 80.0;

/// Runtime category bounds in minutes.
const RUNTIME_SHORT_BELOW: i64 = 90;
const RUNTIME_MEDIUM_UPTO: i64 = 150;

/// Neutral rating used when no row in the dataset carries one.
const NEUTRAL_RATING: f64 = 5.0;

/// Minimum-votes constant `m` in the Bayesian weighted score.
const MIN_VOTES_CONSTANT: f64 = 500.0;

pub fn rating_category(rating: f64) -> &'static str {
    if rating >= RATING_EXCELLENT {
        "Excellent"
    } else if rating >= RATING_GOOD {
        "Good"
    } else if rating >= RATING_AVERAGE {
        "Average"
    } else {
        "Poor"
    }
}

pub fn popularity_bucket(popularity: f64) -> &'static str {
    if popularity < POPULARITY_MEDIUM {
        "Low"
    } else if popularity < POPULARITY_HIGH {
        "Medium"
    } else if popularity < POPULARITY_VERY_HIGH {
        "High"
    } else {
        "Very High"
    }
}

pub fn runtime_category(runtime: i64) -> &'static str {
    if runtime < RUNTIME_SHORT_BELOW {
        "Short"
    } else if runtime <= RUNTIME_MEDIUM_UPTO {
        "Medium"
    } else {
        "Long"
    }
}

/// Decade label with a distinguished bucket for everything before 2000.
pub fn era_label(year: i32) -> String {
    if year >= 2000 {
        format!("{}s", (year / 10) * 10)
    } else {
        "Pre-2000".to_string()
    }
}

/// Bayesian-average blend of a row's rating and the dataset mean, weighted
/// by vote-count confidence: `(v/(v+m))*R + (m/(v+m))*C`.
pub fn weighted_score(rating: f64, vote_count: i64, dataset_mean: f64) -> f64 {
    let v = vote_count.max(0) as f64;
    let m = MIN_VOTES_CONSTANT;
    (v / (v + m)) * rating + (m / (v + m)) * dataset_mean
}

/// Cleans a standardized table and derives the six feature columns.
///
/// Every step reads its input and produces new rows; the caller's table is
/// never mutated.
pub struct Transformer {
    current_year: i32,
}

impl Transformer {
    pub fn new() -> Self {
        Self::with_current_year(Utc::now().year())
    }

    pub fn with_current_year(current_year: i32) -> Self {
        Transformer { current_year }
    }

    pub fn transform(&self, records: &[MovieRecord]) -> Vec<ProcessedMovie> {
        let cleaned = self.clean(records);
        info!(
            "cleaned {} of {} records ({} dropped)",
            cleaned.len(),
            records.len(),
            records.len() - cleaned.len()
        );

        self.engineer_features(cleaned)
    }

    /// Cleaning, in fixed order: drop rows missing essential fields, fill
    /// missing numerics, then drop exact (title, release_year) duplicates
    /// keeping the first occurrence.
    fn clean(&self, records: &[MovieRecord]) -> Vec<CleanMovie> {
        let rating_fill = median(
            records.iter().filter_map(|r| r.rating),
        )
        .unwrap_or(NEUTRAL_RATING);
        let runtime_fill = median(
            records.iter().filter_map(|r| r.runtime.map(|v| v as f64)),
        )
        .map(|m| m.round() as i64)
        .unwrap_or(0);

        let mut seen: HashSet<(String, i32)> = HashSet::new();
        let mut cleaned = Vec::new();

        for record in records {
            let title = record.title.trim();
            if title.is_empty() {
                continue;
            }
            let Some(release_year) = record.release_year else {
                continue;
            };

            if !seen.insert((title.to_string(), release_year)) {
                continue;
            }

            cleaned.push(CleanMovie {
                movie_id: record.movie_id.clone(),
                title: title.to_string(),
                genres: record.genres.trim().to_string(),
                release_year,
                runtime: record.runtime.unwrap_or(runtime_fill).max(0),
                rating: record.rating.unwrap_or(rating_fill),
                vote_count: record.vote_count.unwrap_or(0).max(0),
                popularity: record.popularity.unwrap_or(0.0),
                overview: record.overview.trim().to_string(),
            });
        }

        cleaned
    }

    fn engineer_features(&self, cleaned: Vec<CleanMovie>) -> Vec<ProcessedMovie> {
        let dataset_mean = if cleaned.is_empty() {
            NEUTRAL_RATING
        } else {
            cleaned.iter().map(|m| m.rating).sum::<f64>() / cleaned.len() as f64
        };

        cleaned
            .into_iter()
            .map(|movie| {
                let genre_count = movie
                    .genres
                    .split('|')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .count();

                ProcessedMovie {
                    movie_age: self.current_year - movie.release_year,
                    rating_category: rating_category(movie.rating).to_string(),
                    popularity_bucket: popularity_bucket(movie.popularity).to_string(),
                    runtime_category: runtime_category(movie.runtime).to_string(),
                    era: era_label(movie.release_year),
                    genre_count,
                    weighted_score: weighted_score(
                        movie.rating,
                        movie.vote_count,
                        dataset_mean,
                    ),
                    movie_id: movie.movie_id,
                    title: movie.title,
                    genres: movie.genres,
                    release_year: movie.release_year,
                    runtime: movie.runtime,
                    rating: movie.rating,
                    vote_count: movie.vote_count,
                    popularity: movie.popularity,
                    overview: movie.overview,
                }
            })
            .collect()
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Intermediate row between cleaning and feature engineering: all fills
/// applied, concrete types everywhere.
struct CleanMovie {
    movie_id: String,
    title: String,
    genres: String,
    release_year: i32,
    runtime: i64,
    rating: f64,
    vote_count: i64,
    popularity: f64,
    overview: String,
}

fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, year: i32, rating: f64) -> MovieRecord {
        MovieRecord {
            movie_id: String::new(),
            title: title.to_string(),
            genres: "Drama".to_string(),
            release_year: Some(year),
            runtime: Some(120),
            rating: Some(rating),
            vote_count: Some(10_000),
            popularity: Some(40.0),
            overview: String::new(),
        }
    }

    #[test]
    fn test_rating_category_boundaries() {
        assert_eq!(rating_category(8.5), "Excellent");
        assert_eq!(rating_category(8.49999), "Good");
        assert_eq!(rating_category(7.0), "Good");
        assert_eq!(rating_category(5.0), "Average");
        assert_eq!(rating_category(4.99), "Poor");
    }

    #[test]
    fn test_runtime_categories() {
        assert_eq!(runtime_category(89), "Short");
        assert_eq!(runtime_category(90), "Medium");
        assert_eq!(runtime_category(148), "Medium");
        assert_eq!(runtime_category(150), "Medium");
        assert_eq!(runtime_category(151), "Long");
    }

    #[test]
    fn test_era_labels() {
        assert_eq!(era_label(2024), "2020s");
        assert_eq!(era_label(2015), "2010s");
        assert_eq!(era_label(2000), "2000s");
        assert_eq!(era_label(1999), "Pre-2000");
        assert_eq!(era_label(1942), "Pre-2000");
    }

    #[test]
    fn test_weighted_score_monotonic_in_rating() {
        let mean = 6.5;
        let mut previous = f64::MIN;
        for tenths in 0..=100 {
            let rating = tenths as f64 / 10.0;
            let score = weighted_score(rating, 2_000, mean);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_weighted_score_regresses_to_mean_without_votes() {
        let mean = 6.5;
        assert!((weighted_score(9.9, 0, mean) - mean).abs() < 1e-9);
        // With few votes the score sits close to the mean, far from the
        // raw rating.
        let low_confidence = weighted_score(9.9, 10, mean);
        assert!((low_confidence - mean).abs() < 0.1);
        // With many votes it approaches the raw rating.
        let high_confidence = weighted_score(9.9, 1_000_000, mean);
        assert!((high_confidence - 9.9).abs() < 0.01);
    }

    #[test]
    fn test_drops_rows_missing_essentials() {
        let mut missing_title = record("", 2000, 7.0);
        missing_title.title = "  ".to_string();
        let mut missing_year = record("No Year", 2000, 7.0);
        missing_year.release_year = None;

        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[missing_title, missing_year, record("Kept", 2001, 7.0)]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }

    #[test]
    fn test_deduplicates_on_title_and_year_keeping_first() {
        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[
            record("Solaris", 1972, 8.1),
            record("Solaris", 2002, 6.2),
            record("Solaris", 1972, 3.0),
        ]);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].rating, 8.1);
    }

    #[test]
    fn test_missing_rating_filled_with_median() {
        let mut unrated = record("Unrated", 2010, 0.0);
        unrated.rating = None;

        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[
            record("A", 2001, 6.0),
            record("B", 2002, 7.0),
            record("C", 2003, 8.0),
            unrated,
        ]);

        let filled = out.iter().find(|m| m.title == "Unrated").unwrap();
        assert_eq!(filled.rating, 7.0);
    }

    #[test]
    fn test_all_ratings_missing_uses_neutral_default() {
        let mut a = record("A", 2001, 0.0);
        a.rating = None;
        let mut b = record("B", 2002, 0.0);
        b.rating = None;

        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[a, b]);
        assert!(out.iter().all(|m| m.rating == NEUTRAL_RATING));
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let mut sparse = record("Sparse", 2010, 7.0);
        sparse.vote_count = None;
        sparse.popularity = None;

        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[sparse]);
        assert_eq!(out[0].vote_count, 0);
        assert_eq!(out[0].popularity, 0.0);
        assert_eq!(out[0].popularity_bucket, "Low");
    }

    #[test]
    fn test_derived_fields_for_known_row() {
        let mut inception = record("Inception", 2010, 8.8);
        inception.genres = "Action|Sci-Fi".to_string();
        inception.runtime = Some(148);
        inception.vote_count = Some(2_000_000);

        let transformer = Transformer::with_current_year(2026);
        let out = transformer.transform(&[inception]);
        let movie = &out[0];

        assert_eq!(movie.rating_category, "Excellent");
        assert_eq!(movie.runtime_category, "Medium");
        assert_eq!(movie.genre_count, 2);
        assert_eq!(movie.era, "2010s");
        assert_eq!(movie.movie_age, 16);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let input = vec![record("Same", 2000, 6.0), record("Same", 2000, 6.0)];
        let transformer = Transformer::with_current_year(2026);
        let _ = transformer.transform(&input);
        assert_eq!(input.len(), 2);
        assert_eq!(input[0].title, "Same");
    }
}
