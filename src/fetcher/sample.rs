use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::MovieRecord;

const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Family",
    "Fantasy",
    "Horror",
    "Mystery",
    "Romance",
    "Science Fiction",
    "Thriller",
    "War",
    "Western",
];

const TITLES: &[&str] = &[
    "The Last Echo",
    "Midnight Runner",
    "Silent Storm",
    "Digital Dreams",
    "Beyond the Horizon",
    "Shadow Protocol",
    "Crystal Empire",
    "Neon City",
    "The Forgotten Path",
    "Quantum Divide",
    "Eternal Flame",
    "Dark Waters",
    "Phoenix Rising",
    "Lost in Time",
    "Broken Compass",
    "Steel Heart",
    "Velvet Revolution",
    "Ghost in Machine",
    "Sacred Ground",
    "Wild Spirit",
    "Golden Hour",
    "Crimson Tide",
    "Silver Lining",
    "Iron Will",
];

const SUFFIXES: &[&str] = &["", "Returns", "Reloaded", "Rising", "Begins", "2", "Redemption"];

/// Generates realistic-shaped sample records for demo runs that need no
/// network and no input files.
pub struct SampleGenerator;

impl SampleGenerator {
    pub fn new() -> Self {
        SampleGenerator
    }

    pub fn generate(&self, count: usize) -> Vec<MovieRecord> {
        let mut rng = rand::thread_rng();
        let mut movies = Vec::with_capacity(count);

        for i in 0..count {
            let base = TITLES.choose(&mut rng).unwrap();
            let suffix = SUFFIXES.choose(&mut rng).unwrap();
            let title = format!("{base} {suffix}").trim().to_string();

            let release_year = rng.gen_range(1990..=2024);
            let num_genres = rng.gen_range(1..=3);
            let genres: Vec<&str> = GENRES
                .choose_multiple(&mut rng, num_genres)
                .copied()
                .collect();

            let rating = (rng.gen_range(4.0..=9.5f64) * 10.0).round() / 10.0;
            let popularity = (rng.gen_range(1.0..=100.0f64) * 100.0).round() / 100.0;

            movies.push(MovieRecord {
                movie_id: format!("TM{:05}", i + 1),
                title,
                genres: genres.join("|"),
                release_year: Some(release_year),
                runtime: Some(rng.gen_range(80..=180)),
                rating: Some(rating),
                vote_count: Some(rng.gen_range(100..=50_000)),
                popularity: Some(popularity),
                overview: format!(
                    "A {} story set in {}.",
                    genres[0].to_lowercase(),
                    release_year
                ),
            });
        }

        movies
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
