use std::sync::Arc;

use crate::services::{index::IndexBundle, providers::MetadataProvider};

/// Shared application state
///
/// The index is immutable once loaded, so handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<IndexBundle>,
    /// Absent when no OMDb key is configured
    pub metadata: Option<Arc<dyn MetadataProvider>>,
}

impl AppState {
    pub fn new(index: Arc<IndexBundle>, metadata: Option<Arc<dyn MetadataProvider>>) -> Self {
        Self { index, metadata }
    }
}
