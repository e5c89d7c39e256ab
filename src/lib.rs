//! Content-based movie recommendations.
//!
//! Movie metadata (genres, keywords, overview) is normalized, weighted with TF-IDF and
//! compared pairwise by cosine similarity. The resulting index is persisted once and
//! served read-only over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
