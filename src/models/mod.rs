use serde::{Deserialize, Serialize};

pub mod movie;

pub use movie::{Corpus, MovieRecord};

/// Sentinel used by OMDb (and by us) for a missing plot or poster
pub const NOT_AVAILABLE: &str = "N/A";

/// One ranked neighbour returned by the query engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub score: f64,
}

/// Plot and poster for a title, either of which may be [`NOT_AVAILABLE`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieDetails {
    pub plot: String,
    pub poster: String,
}

impl MovieDetails {
    pub fn not_available() -> Self {
        Self {
            plot: NOT_AVAILABLE.to_string(),
            poster: NOT_AVAILABLE.to_string(),
        }
    }

    /// Whether the poster is a usable image URL
    pub fn has_poster(&self) -> bool {
        is_poster_url(&self.poster)
    }
}

impl Default for MovieDetails {
    fn default() -> Self {
        Self::not_available()
    }
}

pub(crate) fn is_poster_url(poster: &str) -> bool {
    poster != NOT_AVAILABLE && poster.starts_with("http")
}

/// Recommendation enriched with OMDb details for the API response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationView {
    pub title: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl From<Recommendation> for RecommendationView {
    fn from(rec: Recommendation) -> Self {
        Self {
            title: rec.title,
            score: rec.score,
            plot: None,
            poster: None,
        }
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Response of the by-title (`t=`) and by-id (`i=`) OMDb lookups
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OmdbTitleResponse {
    pub response: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl OmdbTitleResponse {
    pub fn is_found(&self) -> bool {
        self.response == "True"
    }

    /// Converts a successful lookup, filling gaps with the sentinel
    pub fn into_details(self) -> MovieDetails {
        MovieDetails {
            plot: self.plot.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            poster: self.poster.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        }
    }
}

/// Response of the free-text (`s=`) OMDb search
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchHit>,
}

impl OmdbSearchResponse {
    /// IMDb id of the first search hit, if any
    pub fn first_imdb_id(&self) -> Option<&str> {
        if self.response != "True" {
            return None;
        }
        self.search.first().and_then(|hit| hit.imdb_id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OmdbSearchHit {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omdb_title_response_deserialization() {
        let json = r#"{
            "Title": "Inception",
            "Year": "2010",
            "Plot": "A thief who steals corporate secrets.",
            "Poster": "https://m.media-amazon.com/images/inception.jpg",
            "imdbID": "tt1375666",
            "Response": "True"
        }"#;

        let res: OmdbTitleResponse = serde_json::from_str(json).unwrap();
        assert!(res.is_found());
        let details = res.into_details();
        assert_eq!(details.plot, "A thief who steals corporate secrets.");
        assert!(details.has_poster());
    }

    #[test]
    fn test_omdb_not_found_response() {
        let json = r#"{"Response":"False","Error":"Movie not found!"}"#;
        let res: OmdbTitleResponse = serde_json::from_str(json).unwrap();
        assert!(!res.is_found());
        assert_eq!(res.error, Some("Movie not found!".to_string()));
    }

    #[test]
    fn test_omdb_search_first_imdb_id() {
        let json = r#"{
            "Search": [
                {"Title": "Heat", "Year": "1995", "imdbID": "tt0113277", "Type": "movie"},
                {"Title": "Heat", "Year": "1986", "imdbID": "tt0093164", "Type": "movie"}
            ],
            "totalResults": "2",
            "Response": "True"
        }"#;

        let res: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.first_imdb_id(), Some("tt0113277"));
    }

    #[test]
    fn test_omdb_search_without_results() {
        let json = r#"{"Response":"False","Error":"Movie not found!"}"#;
        let res: OmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.first_imdb_id(), None);
    }

    #[test]
    fn test_poster_sentinel_is_not_a_poster() {
        let details = MovieDetails {
            plot: "Some plot".to_string(),
            poster: NOT_AVAILABLE.to_string(),
        };
        assert!(!details.has_poster());
        assert!(!MovieDetails::default().has_poster());
    }

    #[test]
    fn test_recommendation_view_omits_missing_details() {
        let view = RecommendationView::from(Recommendation {
            title: "Beta".to_string(),
            score: 0.5,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Beta", "score": 0.5}));
    }
}
