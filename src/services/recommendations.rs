use std::sync::Arc;

use crate::{
    models::{MovieDetails, Recommendation, RecommendationView},
    services::{index::IndexBundle, providers::MetadataProvider},
};

/// Number of recommendations surfaced when the caller does not ask for a count
pub const DEFAULT_K: usize = 5;

/// Finds the `k` movies most similar to `title`
///
/// The first corpus row whose title matches exactly (case-sensitive) is the query
/// row. An unknown title yields an empty list. Results are ordered by descending
/// score, ties in corpus order, and never include the query row itself. Rows
/// sharing a title are not de-duplicated.
pub fn recommend(index: &IndexBundle, title: &str, k: usize) -> Vec<Recommendation> {
    let Some(row) = index.corpus().position_of(title) else {
        tracing::debug!(title = %title, "Title not in corpus");
        return Vec::new();
    };

    let mut scored: Vec<(usize, f64)> = index
        .similarity()
        .row(row)
        .iter()
        .copied()
        .enumerate()
        .filter(|&(j, _)| j != row)
        .collect();

    // Stable sort keeps corpus order among equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(k)
        .filter_map(|(j, score)| {
            index.record(j).map(|record| Recommendation {
                title: record.title.clone(),
                score,
            })
        })
        .collect()
}

/// Attaches plot and poster to each recommendation
///
/// Lookups run concurrently, one task per title. A failed lookup only affects its own
/// title, which falls back to `"N/A"` details.
pub async fn enrich(
    provider: Arc<dyn MetadataProvider>,
    recommendations: Vec<Recommendation>,
) -> Vec<RecommendationView> {
    let mut tasks = Vec::new();

    for rec in &recommendations {
        let provider = provider.clone();
        let title = rec.title.clone();
        let task = tokio::spawn(async move { provider.movie_details(&title).await });
        tasks.push(task);
    }

    let mut views = Vec::with_capacity(recommendations.len());
    for (rec, task) in recommendations.into_iter().zip(tasks) {
        let details = match task.await {
            Ok(details) => details,
            Err(e) => {
                tracing::error!(error = %e, title = %rec.title, "Metadata task join error");
                MovieDetails::not_available()
            }
        };

        let mut view = RecommendationView::from(rec);
        view.plot = Some(details.plot);
        view.poster = Some(details.poster);
        views.push(view);
    }

    tracing::info!(
        titles = views.len(),
        provider = provider.name(),
        "Recommendations enriched"
    );

    views
}

/// Attaches `"N/A"` details when no metadata provider is configured
pub fn without_details(recommendations: Vec<Recommendation>) -> Vec<RecommendationView> {
    recommendations
        .into_iter()
        .map(|rec| {
            let details = MovieDetails::not_available();
            let mut view = RecommendationView::from(rec);
            view.plot = Some(details.plot);
            view.poster = Some(details.poster);
            view
        })
        .collect()
}
