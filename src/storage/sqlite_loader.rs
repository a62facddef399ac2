use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::info;

use crate::error::PipelineError;
use crate::models::ProcessedMovie;

/// Full schema replacement: dropped and recreated on every load so that a
/// re-run with identical input produces identical contents.
const SCHEMA: &str = "
    DROP TABLE IF EXISTS movie_genres;
    DROP TABLE IF EXISTS genres;
    DROP TABLE IF EXISTS movies;
    DROP TABLE IF EXISTS ratings_summary;

    CREATE TABLE movies (
        movie_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        release_year INTEGER NOT NULL,
        runtime INTEGER,
        rating REAL,
        vote_count INTEGER,
        popularity REAL,
        overview TEXT,
        movie_age INTEGER,
        rating_category TEXT,
        popularity_bucket TEXT,
        runtime_category TEXT,
        era TEXT,
        genre_count INTEGER,
        weighted_score REAL,
        load_date TEXT
    );

    CREATE TABLE genres (
        genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
        genre_name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE movie_genres (
        movie_id TEXT,
        genre_id INTEGER,
        PRIMARY KEY (movie_id, genre_id),
        FOREIGN KEY (movie_id) REFERENCES movies(movie_id),
        FOREIGN KEY (genre_id) REFERENCES genres(genre_id)
    );

    CREATE TABLE ratings_summary (
        rating_category TEXT PRIMARY KEY,
        movie_count INTEGER,
        avg_rating REAL,
        avg_popularity REAL,
        total_votes INTEGER
    );

    CREATE INDEX idx_release_year ON movies(release_year);
    CREATE INDEX idx_rating ON movies(rating);
    CREATE INDEX idx_popularity ON movies(popularity);
    CREATE INDEX idx_era ON movies(era);
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub movies: usize,
    pub genres: usize,
    pub links: usize,
}

/// Loads the processed table into the normalized three-table SQLite schema.
///
/// The whole load runs inside one transaction: either the new contents
/// replace the old tables completely, or the previous database state is left
/// untouched.
pub struct SqliteLoader {
    db_path: PathBuf,
}

impl SqliteLoader {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        SqliteLoader {
            db_path: db_path.into(),
        }
    }

    pub fn load(&self, movies: &[ProcessedMovie]) -> Result<LoadSummary, PipelineError> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(&self.db_path)?;
        let tx = conn.transaction()?;

        tx.execute_batch(SCHEMA)?;

        let genre_ids = intern_genres(&tx, movies)?;
        insert_movies(&tx, movies)?;
        link_movie_genres(&tx, movies, &genre_ids)?;
        build_ratings_summary(&tx)?;

        let summary = LoadSummary {
            movies: count_rows(&tx, "movies")?,
            genres: count_rows(&tx, "genres")?,
            links: count_rows(&tx, "movie_genres")?,
        };

        tx.commit()?;

        info!(
            "load complete: {} movies, {} genres, {} movie-genre links",
            summary.movies, summary.genres, summary.links
        );

        Ok(summary)
    }
}

/// Insert one row per distinct genre name, sorted for stable ids, and
/// return the name -> id map.
fn intern_genres(
    tx: &rusqlite::Transaction<'_>,
    movies: &[ProcessedMovie],
) -> Result<HashMap<String, i64>, PipelineError> {
    let names: BTreeSet<String> = movies
        .iter()
        .flat_map(|m| m.genre_tokens().into_iter().map(str::to_string))
        .collect();

    let mut ids = HashMap::new();
    let mut stmt = tx.prepare("INSERT INTO genres (genre_name) VALUES (?1)")?;
    for name in names {
        stmt.execute(params![name])?;
        ids.insert(name, tx.last_insert_rowid());
    }

    Ok(ids)
}

fn insert_movies(
    tx: &rusqlite::Transaction<'_>,
    movies: &[ProcessedMovie],
) -> Result<(), PipelineError> {
    let load_date = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let mut stmt = tx.prepare(
        "INSERT INTO movies (
            movie_id, title, release_year, runtime, rating, vote_count,
            popularity, overview, movie_age, rating_category,
            popularity_bucket, runtime_category, era, genre_count,
            weighted_score, load_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;

    for movie in movies {
        let result = stmt.execute(params![
            movie.movie_id,
            movie.title,
            movie.release_year,
            movie.runtime,
            movie.rating,
            movie.vote_count,
            movie.popularity,
            movie.overview,
            movie.movie_age,
            movie.rating_category,
            movie.popularity_bucket,
            movie.runtime_category,
            movie.era,
            movie.genre_count as i64,
            movie.weighted_score,
            load_date,
        ]);

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(PipelineError::SchemaViolation(format!(
                    "duplicate movie_id `{}` in load",
                    movie.movie_id
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn link_movie_genres(
    tx: &rusqlite::Transaction<'_>,
    movies: &[ProcessedMovie],
    genre_ids: &HashMap<String, i64>,
) -> Result<(), PipelineError> {
    let mut stmt =
        tx.prepare("INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?1, ?2)")?;

    for movie in movies {
        for token in movie.genre_tokens() {
            if let Some(genre_id) = genre_ids.get(token) {
                stmt.execute(params![movie.movie_id, genre_id])?;
            }
        }
    }

    Ok(())
}

fn build_ratings_summary(tx: &rusqlite::Transaction<'_>) -> Result<(), PipelineError> {
    tx.execute(
        "INSERT INTO ratings_summary
         SELECT rating_category,
                COUNT(*) AS movie_count,
                AVG(rating) AS avg_rating,
                AVG(popularity) AS avg_popularity,
                SUM(vote_count) AS total_votes
         FROM movies
         GROUP BY rating_category",
        [],
    )?;
    Ok(())
}

fn count_rows(tx: &rusqlite::Transaction<'_>, table: &str) -> Result<usize, PipelineError> {
    let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: &str, title: &str, genres: &str) -> ProcessedMovie {
        ProcessedMovie {
            movie_id: id.to_string(),
            title: title.to_string(),
            genres: genres.to_string(),
            release_year: 2010,
            runtime: 120,
            rating: 7.5,
            vote_count: 10_000,
            popularity: 45.0,
            overview: String::new(),
            movie_age: 16,
            rating_category: "Good".to_string(),
            popularity_bucket: "Medium".to_string(),
            runtime_category: "Medium".to_string(),
            era: "2010s".to_string(),
            genre_count: genres.split('|').count(),
            weighted_score: 7.4,
        }
    }

    fn temp_loader(dir: &tempfile::TempDir) -> SqliteLoader {
        SqliteLoader::new(dir.path().join("movies.db"))
    }

    #[test]
    fn test_genre_split_creates_junction_rows() {
        let dir = tempfile::tempdir().unwrap();
        let loader = temp_loader(&dir);

        let summary = loader
            .load(&[movie("M1", "Heat", "Action|Drama")])
            .unwrap();
        assert_eq!(summary.movies, 1);
        assert_eq!(summary.genres, 2);
        assert_eq!(summary.links, 2);

        let conn = Connection::open(dir.path().join("movies.db")).unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT g.genre_name FROM movie_genres mg
                 JOIN genres g ON g.genre_id = mg.genre_id
                 WHERE mg.movie_id = 'M1' ORDER BY g.genre_name",
            )
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["Action".to_string(), "Drama".to_string()]);
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let loader = temp_loader(&dir);
        let movies = vec![
            movie("M1", "Heat", "Action|Crime"),
            movie("M2", "Alien", "Horror|Sci-Fi"),
        ];

        let first = loader.load(&movies).unwrap();
        let second = loader.load(&movies).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.movies, 2);
        assert_eq!(second.genres, 4);
        assert_eq!(second.links, 4);
    }

    #[test]
    fn test_duplicate_movie_id_is_fatal_and_preserves_previous_load() {
        let dir = tempfile::tempdir().unwrap();
        let loader = temp_loader(&dir);

        loader.load(&[movie("M1", "First", "Drama")]).unwrap();

        let err = loader
            .load(&[movie("M2", "A", "Drama"), movie("M2", "B", "Drama")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation(_)));

        // Failed load rolled back; the earlier contents are intact.
        let conn = Connection::open(dir.path().join("movies.db")).unwrap();
        let title: String = conn
            .query_row("SELECT title FROM movies WHERE movie_id = 'M1'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(title, "First");
    }

    #[test]
    fn test_indexes_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let loader = temp_loader(&dir);
        loader.load(&[movie("M1", "Heat", "Action")]).unwrap();

        let conn = Connection::open(dir.path().join("movies.db")).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for expected in ["idx_release_year", "idx_rating", "idx_popularity", "idx_era"] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }

    #[test]
    fn test_ratings_summary_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        let loader = temp_loader(&dir);

        let mut excellent = movie("M1", "Top", "Drama");
        excellent.rating = 9.0;
        excellent.rating_category = "Excellent".to_string();
        let good_a = movie("M2", "Mid A", "Drama");
        let good_b = movie("M3", "Mid B", "Drama");

        loader.load(&[excellent, good_a, good_b]).unwrap();

        let conn = Connection::open(dir.path().join("movies.db")).unwrap();
        let good_count: i64 = conn
            .query_row(
                "SELECT movie_count FROM ratings_summary WHERE rating_category = 'Good'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(good_count, 2);
    }
}
