use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetcher::MovieProvider;
use crate::models::{MovieRecord, RawTable};
use crate::processor::{ColumnMapper, SourceProfile};

const PAGE_SIZE: usize = 20;

/// TMDB genre ids as returned by the list endpoints.
const TMDB_GENRES: &[(i64, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Fetches popular movies from the TMDB API.
///
/// A missing API key is an immediate `FetchFailure` without any network
/// attempt; the chain then advances to the next provider. Pages are fetched
/// once each, no retries.
pub struct TmdbFetcher {
    base_url: String,
    api_key: Option<String>,
}

impl TmdbFetcher {
    pub fn new(config: &PipelineConfig) -> Self {
        TmdbFetcher {
            base_url: config.extraction.tmdb_base_url.clone(),
            api_key: config.tmdb_api_key(),
        }
    }

    fn client(&self) -> Result<Client, PipelineError> {
        Client::builder()
            .emulation(Emulation::Firefox136)
            .build()
            .map_err(|e| PipelineError::fetch("tmdb", e))
    }

    /// Flatten one page of `results` into rows of the TMDB column layout.
    fn page_rows(&self, data: &Value, rows: &mut Vec<Vec<String>>) {
        let Some(results) = data.get("results").and_then(|r| r.as_array()) else {
            return;
        };

        for movie in results {
            let genre_names = movie
                .get("genre_ids")
                .and_then(|g| g.as_array())
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| id.as_i64())
                        .filter_map(genre_name)
                        .collect::<Vec<_>>()
                        .join("|")
                })
                .unwrap_or_default();

            rows.push(vec![
                movie
                    .get("id")
                    .and_then(|v| v.as_i64())
                    .map(|id| format!("TMDB{id}"))
                    .unwrap_or_default(),
                movie
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown")
                    .to_string(),
                genre_names,
                movie
                    .get("release_date")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                // The popular endpoint does not include runtime.
                "120".to_string(),
                movie
                    .get("vote_average")
                    .and_then(|v| v.as_f64())
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                movie
                    .get("vote_count")
                    .and_then(|v| v.as_i64())
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                movie
                    .get("popularity")
                    .and_then(|v| v.as_f64())
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                movie
                    .get("overview")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            ]);
        }
    }
}

#[async_trait]
impl MovieProvider for TmdbFetcher {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn fetch(&self, count: usize) -> Result<Vec<MovieRecord>, PipelineError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(PipelineError::fetch("tmdb", "no API key configured"));
        };

        let client = self.client()?;
        let pages = count.div_ceil(PAGE_SIZE).max(1);
        let mut rows = Vec::new();

        for page in 1..=pages {
            let url = format!(
                "{}/movie/popular?api_key={}&page={}&language=en-US",
                self.base_url, api_key, page
            );
            info!("fetching TMDB page {} of {}", page, pages);

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| PipelineError::fetch("tmdb", e))?;

            if !response.status().is_success() {
                return Err(PipelineError::fetch(
                    "tmdb",
                    format!("HTTP error: {}", response.status()),
                ));
            }

            let data: Value = response
                .json()
                .await
                .map_err(|e| PipelineError::fetch("tmdb", e))?;

            self.page_rows(&data, &mut rows);

            // Free-tier rate limit.
            sleep(Duration::from_millis(300)).await;
        }

        if rows.is_empty() {
            return Err(PipelineError::fetch("tmdb", "no results in any page"));
        }

        rows.truncate(count);

        // Standardize through the regular profile mapping, same path an
        // imported TMDB file would take.
        let table = RawTable::new(
            vec![
                "id".to_string(),
                "title".to_string(),
                "genres".to_string(),
                "release_date".to_string(),
                "runtime".to_string(),
                "vote_average".to_string(),
                "vote_count".to_string(),
                "popularity".to_string(),
                "overview".to_string(),
            ],
            rows,
        );

        let mapper = ColumnMapper::new();
        let mapping = mapper.resolve(&table, SourceProfile::Tmdb);
        let records = mapper.apply(&table, &mapping);

        if records.is_empty() {
            warn!("TMDB response mapped to zero records");
            return Err(PipelineError::fetch("tmdb", "mapped to zero records"));
        }

        Ok(records)
    }
}

fn genre_name(id: i64) -> Option<String> {
    TMDB_GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| name.to_string())
}
