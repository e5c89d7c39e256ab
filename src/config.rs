use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Primary movie corpus (CSV with genres, keywords, overview, title)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Smaller sample corpus used when the primary one is absent
    #[serde(default = "default_fallback_corpus_path")]
    pub fallback_corpus_path: PathBuf,

    /// Directory holding the persisted index bundle
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Vocabulary cap for the TF-IDF vectorizer
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    /// OMDb API key; recommendation details are disabled without it
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Per-request timeout for OMDb calls, in seconds
    #[serde(default = "default_omdb_timeout_secs")]
    pub omdb_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/movies.csv")
}

fn default_fallback_corpus_path() -> PathBuf {
    PathBuf::from("data/sample_movies.csv")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("data/index")
}

fn default_max_features() -> usize {
    5000
}

fn default_omdb_api_url() -> String {
    "http://www.omdbapi.com".to_string()
}

fn default_omdb_timeout_secs() -> u64 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Picks the corpus file to build from: the primary one if present, else the sample
    pub fn corpus_source(&self) -> PathBuf {
        if self.corpus_path.exists() {
            self.corpus_path.clone()
        } else {
            self.fallback_corpus_path.clone()
        }
    }

    pub fn omdb_timeout(&self) -> Duration {
        Duration::from_secs(self.omdb_timeout_secs)
    }

    /// Socket address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: Vec<(&str, &str)>) -> Config {
        envy::from_iter(
            vars.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config_from(vec![]);
        assert_eq!(config.index_dir, PathBuf::from("data/index"));
        assert_eq!(config.max_features, 5000);
        assert_eq!(config.omdb_api_key, None);
        assert_eq!(config.omdb_timeout(), Duration::from_secs(5));
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(vec![
            ("OMDB_API_KEY", "abc123"),
            ("PORT", "8080"),
            ("MAX_FEATURES", "100"),
        ]);
        assert_eq!(config.omdb_api_key, Some("abc123".to_string()));
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_features, 100);
    }

    #[test]
    fn test_corpus_source_falls_back_to_sample() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("movies.csv");
        let sample = dir.path().join("sample_movies.csv");
        let primary_str = primary.to_string_lossy().to_string();
        let sample_str = sample.to_string_lossy().to_string();

        let config = config_from(vec![
            ("CORPUS_PATH", primary_str.as_str()),
            ("FALLBACK_CORPUS_PATH", sample_str.as_str()),
        ]);
        assert_eq!(config.corpus_source(), sample);

        std::fs::write(&primary, "title,genres,keywords,overview\n").unwrap();
        assert_eq!(config.corpus_source(), primary);
    }
}
