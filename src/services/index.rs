use chrono::{DateTime, Utc};
use std::time::Instant;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Corpus, MovieRecord},
    services::{
        similarity::SimilarityMatrix,
        vectorizer::{TfidfVectorizer, VectorSpaceModel},
    },
};

/// Fits TF-IDF over the corpus and computes all pairwise similarities
pub fn build_index(
    corpus: &Corpus,
    max_features: usize,
) -> AppResult<(VectorSpaceModel, SimilarityMatrix)> {
    if corpus.is_empty() {
        return Err(AppError::EmptyCorpus);
    }

    let started = Instant::now();
    let documents = corpus.documents();

    let mut vectorizer = TfidfVectorizer::new(max_features);
    let matrix = vectorizer.fit_transform(&documents)?;
    tracing::info!(
        rows = matrix.n_rows(),
        cols = matrix.n_cols(),
        nnz = matrix.nnz(),
        "TF-IDF matrix built"
    );

    let similarity = SimilarityMatrix::from_tfidf(&matrix);
    tracing::info!(
        size = similarity.size(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Cosine similarity matrix computed"
    );

    Ok((vectorizer.into_model(matrix), similarity))
}

/// The queryable index: corpus, vector space and similarities from a single build
///
/// Immutable once constructed; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct IndexBundle {
    build_id: Uuid,
    built_at: DateTime<Utc>,
    corpus: Corpus,
    model: VectorSpaceModel,
    similarity: SimilarityMatrix,
}

impl IndexBundle {
    /// Builds a fresh bundle with a new build id
    pub fn build(corpus: Corpus, max_features: usize) -> AppResult<Self> {
        let (model, similarity) = build_index(&corpus, max_features)?;
        let bundle = Self {
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            corpus,
            model,
            similarity,
        };

        tracing::info!(
            build_id = %bundle.build_id,
            documents = bundle.len(),
            vocabulary = bundle.model.vocabulary_size(),
            "Index bundle built"
        );

        Ok(bundle)
    }

    /// Reassembles a bundle from persisted parts, rejecting any row-order skew
    pub fn from_parts(
        build_id: Uuid,
        built_at: DateTime<Utc>,
        corpus: Corpus,
        model: VectorSpaceModel,
        similarity: SimilarityMatrix,
    ) -> AppResult<Self> {
        let rows = corpus.len();
        if model.n_documents() != rows {
            return Err(AppError::IndexInconsistent(format!(
                "document-term matrix has {} rows, corpus has {}",
                model.n_documents(),
                rows
            )));
        }
        if similarity.size() != rows || !similarity.is_well_formed() {
            return Err(AppError::IndexInconsistent(format!(
                "similarity matrix is not {}x{}",
                rows, rows
            )));
        }
        if model.idf.len() != model.vocabulary_size()
            || model.matrix.n_cols() != model.vocabulary_size()
        {
            return Err(AppError::IndexInconsistent(
                "vocabulary does not match matrix columns".to_string(),
            ));
        }

        Ok(Self {
            build_id,
            built_at,
            corpus,
            model,
            similarity,
        })
    }

    pub fn build_id(&self) -> Uuid {
        self.build_id
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn model(&self) -> &VectorSpaceModel {
        &self.model
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn record(&self, row: usize) -> Option<&MovieRecord> {
        self.corpus.get(row)
    }
}
