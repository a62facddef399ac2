use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::PipelineError;
use crate::models::ProcessedMovie;

/// Aggregate statistics over the processed table, the numbers the dashboard
/// and the text report are built from.
#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub total_movies: usize,
    pub avg_rating: f64,
    pub median_rating: f64,
    pub avg_runtime: f64,
    pub avg_popularity: f64,
    pub year_range: (i32, i32),
    pub distinct_genres: usize,
    pub by_rating_category: BTreeMap<String, usize>,
    pub by_era: BTreeMap<String, usize>,
    pub top_weighted: Vec<(String, f64)>,
}

const TOP_WEIGHTED_LEN: usize = 10;

pub fn summarize(movies: &[ProcessedMovie]) -> SummaryStats {
    let total = movies.len();

    let mut ratings: Vec<f64> = movies.iter().map(|m| m.rating).collect();
    ratings.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let median_rating = if ratings.is_empty() {
        0.0
    } else if ratings.len() % 2 == 0 {
        (ratings[ratings.len() / 2 - 1] + ratings[ratings.len() / 2]) / 2.0
    } else {
        ratings[ratings.len() / 2]
    };

    let mean = |values: Vec<f64>| -> f64 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };

    let genres: HashSet<&str> = movies.iter().flat_map(|m| m.genre_tokens()).collect();

    let mut by_rating_category = BTreeMap::new();
    let mut by_era = BTreeMap::new();
    for movie in movies {
        *by_rating_category
            .entry(movie.rating_category.clone())
            .or_insert(0) += 1;
        *by_era.entry(movie.era.clone()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, f64)> = movies
        .iter()
        .map(|m| (m.title.clone(), m.weighted_score))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    ranked.truncate(TOP_WEIGHTED_LEN);

    SummaryStats {
        total_movies: total,
        avg_rating: mean(movies.iter().map(|m| m.rating).collect()),
        median_rating,
        avg_runtime: mean(movies.iter().map(|m| m.runtime as f64).collect()),
        avg_popularity: mean(movies.iter().map(|m| m.popularity).collect()),
        year_range: (
            movies.iter().map(|m| m.release_year).min().unwrap_or(0),
            movies.iter().map(|m| m.release_year).max().unwrap_or(0),
        ),
        distinct_genres: genres.len(),
        by_rating_category,
        by_era,
        top_weighted: ranked,
    }
}

pub fn render(stats: &SummaryStats) -> String {
    let mut out = String::new();
    let line = "=".repeat(78);

    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "PROCESSED DATA SUMMARY");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Total movies:      {}", stats.total_movies);
    let _ = writeln!(out, "Average rating:    {:.2}", stats.avg_rating);
    let _ = writeln!(out, "Median rating:     {:.2}", stats.median_rating);
    let _ = writeln!(out, "Average runtime:   {:.1} min", stats.avg_runtime);
    let _ = writeln!(out, "Average popularity:{:.2}", stats.avg_popularity);
    let _ = writeln!(
        out,
        "Year range:        {} - {}",
        stats.year_range.0, stats.year_range.1
    );
    let _ = writeln!(out, "Distinct genres:   {}", stats.distinct_genres);

    let _ = writeln!(out);
    let _ = writeln!(out, "Movies by rating category:");
    for (category, count) in &stats.by_rating_category {
        let _ = writeln!(out, "  {category:<12} {count}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Movies by era:");
    for (era, count) in &stats.by_era {
        let _ = writeln!(out, "  {era:<12} {count}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Top movies by weighted score:");
    for (rank, (title, score)) in stats.top_weighted.iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {title} ({score:.2})", rank + 1);
    }

    let _ = writeln!(out, "{line}");
    out
}

pub fn write_report(path: &Path, stats: &SummaryStats) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render(stats))?;
    info!("summary report saved to {}", path.display());
    Ok(())
}
