use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::info;
use wreq::Client;
use wreq_util::Emulation;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetcher::MovieProvider;
use crate::models::MovieRecord;

/// Scrapes film titles from a Wikipedia film-list page.
///
/// Wikipedia carries no ratings or vote counts, so the non-title fields are
/// synthesized deterministically from the row position, the same shapes the
/// downstream stages expect.
pub struct WikipediaFetcher {
    client: Client,
    url: String,
}

impl WikipediaFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(WikipediaFetcher {
            client,
            url: config.extraction.wikipedia_url.clone(),
        })
    }
}

#[async_trait]
impl MovieProvider for WikipediaFetcher {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn fetch(&self, count: usize) -> Result<Vec<MovieRecord>, PipelineError> {
        info!("fetching film list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PipelineError::fetch("wikipedia", e))?;

        if !response.status().is_success() {
            return Err(PipelineError::fetch(
                "wikipedia",
                format!("HTTP error: {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::fetch("wikipedia", e))?;

        let mut records = parse_film_table(&body);
        if records.is_empty() {
            return Err(PipelineError::fetch(
                "wikipedia",
                "no film rows found in page",
            ));
        }

        records.truncate(count);
        Ok(records)
    }
}

/// Pull (title, year) pairs out of the page's wikitables and synthesize the
/// remaining fields. Rows without a recognizable year are skipped.
fn parse_film_table(body: &str) -> Vec<MovieRecord> {
    let document = Html::parse_document(body);
    let row_selector = Selector::parse("table.wikitable tbody tr").unwrap();
    let title_selector = Selector::parse("i a").unwrap();
    let year_regex = Regex::new(r"\b(18|19|20)\d{2}\b").unwrap();

    let mut records = Vec::new();

    for row in document.select(&row_selector) {
        let Some(link) = row.select(&title_selector).next() else {
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.len() < 2 {
            continue;
        }

        let row_text = row.text().collect::<String>();
        let Some(year) = year_regex
            .find(&row_text)
            .and_then(|m| m.as_str().parse::<i32>().ok())
        else {
            continue;
        };

        let index = records.len();
        records.push(MovieRecord {
            movie_id: format!("WIKI{:05}", index + 1),
            title,
            genres: "Unknown".to_string(),
            release_year: Some(year),
            runtime: Some(110),
            rating: Some(6.0 + (index % 4) as f64 * 0.5),
            vote_count: Some(1_000 + index as i64 * 100),
            popularity: Some((30 + index % 70) as f64),
            overview: format!("A film from {year}"),
        });
    }

    records
}
