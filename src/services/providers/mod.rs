/// Movie metadata provider abstraction
///
/// Providers enrich recommended titles with a plot and poster URL. They are external
/// collaborators of the recommender: a provider never fails a request, it reports a
/// lookup it could not complete as `"N/A"` details instead.
use crate::models::MovieDetails;

pub mod omdb;

pub use omdb::{HttpOmdbApi, OmdbApi, OmdbProvider};

/// Trait for movie metadata providers
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch plot and poster for a title
    ///
    /// Implementations retry alternate spellings of the title on their own and return
    /// [`MovieDetails::not_available`] when every attempt fails.
    async fn movie_details(&self, title: &str) -> MovieDetails;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
