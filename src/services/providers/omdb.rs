/// OMDb metadata provider
///
/// Resolves a corpus title to a plot and poster. Corpus titles rarely match OMDb's
/// spelling exactly, so several lookups are tried in order:
/// 1. Exact title: `?t={title}&plot=full`
/// 2. Cleaned title (year, punctuation and articles stripped), if different
/// 3. `"The " + title`, unless the title already starts with "The "
/// 4. Free-text search `?s={cleaned}`, first hit resolved via `?i={imdb_id}&plot=full`
///
/// The first hit with a poster URL wins. Every attempt is independent: a timeout or
/// network error is logged and the next attempt still runs.
use regex::Regex;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::{sync::LazyLock, time::Duration};

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, OmdbSearchResponse, OmdbTitleResponse, NOT_AVAILABLE},
    services::providers::MetadataProvider,
};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)").unwrap());
static PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(The|A|An)\s+").unwrap());

/// Strips noise that commonly breaks OMDb exact-title matching
pub fn clean_title_for_search(title: &str) -> String {
    let title = YEAR_RE.replace_all(title, "");
    let title = PUNCTUATION_RE.replace_all(&title, "");
    let title = ARTICLE_RE.replace_all(&title, "");
    title.trim().to_string()
}

/// Exact-title lookups to attempt, in order
fn title_candidates(title: &str, cleaned: &str) -> Vec<String> {
    let mut candidates = vec![title.to_string()];
    if cleaned != title {
        candidates.push(cleaned.to_string());
    }
    if !title.to_lowercase().starts_with("the ") {
        candidates.push(format!("The {}", title));
    }
    candidates
}

/// Raw OMDb endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OmdbApi: Send + Sync {
    /// Exact-title lookup with full plot
    async fn by_title(&self, title: &str) -> AppResult<OmdbTitleResponse>;

    /// Lookup by IMDb id with full plot
    async fn by_imdb_id(&self, imdb_id: &str) -> AppResult<OmdbTitleResponse>;

    /// Free-text title search
    async fn search(&self, query: &str) -> AppResult<OmdbSearchResponse>;
}

/// OMDb over HTTP; every request carries its own timeout
#[derive(Clone)]
pub struct HttpOmdbApi {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl HttpOmdbApi {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url,
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> AppResult<T> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl OmdbApi for HttpOmdbApi {
    async fn by_title(&self, title: &str) -> AppResult<OmdbTitleResponse> {
        self.get(&[("t", title), ("plot", "full")]).await
    }

    async fn by_imdb_id(&self, imdb_id: &str) -> AppResult<OmdbTitleResponse> {
        self.get(&[("i", imdb_id), ("plot", "full")]).await
    }

    async fn search(&self, query: &str) -> AppResult<OmdbSearchResponse> {
        self.get(&[("s", query)]).await
    }
}

pub struct OmdbProvider<A> {
    api: A,
}

impl<A: OmdbApi> OmdbProvider<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Searches by free text and resolves the first hit by IMDb id
    async fn search_fallback(&self, query: &str) -> AppResult<Option<MovieDetails>> {
        let results = self.api.search(query).await?;
        let Some(imdb_id) = results.first_imdb_id() else {
            return Ok(None);
        };

        let res = self.api.by_imdb_id(imdb_id).await?;
        Ok(res.is_found().then(|| res.into_details()))
    }
}

/// Keeps the first real plot seen, for when no attempt produces a poster
fn remember_plot(fallback: &mut Option<String>, plot: String) {
    if fallback.is_none() && plot != NOT_AVAILABLE {
        *fallback = Some(plot);
    }
}

#[async_trait::async_trait]
impl<A: OmdbApi> MetadataProvider for OmdbProvider<A> {
    async fn movie_details(&self, title: &str) -> MovieDetails {
        let cleaned = clean_title_for_search(title);
        let mut fallback_plot = None;

        for candidate in title_candidates(title, &cleaned) {
            match self.api.by_title(&candidate).await {
                Ok(res) if res.is_found() => {
                    let details = res.into_details();
                    if details.has_poster() {
                        tracing::debug!(title = %title, candidate = %candidate, "OMDb title hit");
                        return details;
                    }
                    remember_plot(&mut fallback_plot, details.plot);
                }
                Ok(res) => {
                    tracing::debug!(
                        candidate = %candidate,
                        error = res.error.as_deref().unwrap_or_default(),
                        "OMDb title miss"
                    );
                }
                Err(e) => {
                    tracing::warn!(candidate = %candidate, error = %e, "OMDb title lookup failed");
                }
            }
        }

        if !cleaned.is_empty() {
            match self.search_fallback(&cleaned).await {
                Ok(Some(details)) if details.has_poster() => {
                    tracing::debug!(title = %title, "OMDb search hit");
                    return details;
                }
                Ok(Some(details)) => remember_plot(&mut fallback_plot, details.plot),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(query = %cleaned, error = %e, "OMDb search failed");
                }
            }
        }

        tracing::info!(
            title = %title,
            has_plot = fallback_plot.is_some(),
            "No OMDb poster found"
        );

        MovieDetails {
            plot: fallback_plot.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            poster: NOT_AVAILABLE.to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
