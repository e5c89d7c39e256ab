//! TF-IDF vectorization over the normalized corpus.
//!
//! ```text
//! tfidf(t, d) = tf(t, d) * idf(t)
//! tf(t, d)    = count of t in d
//! idf(t)      = ln((1 + N) / (1 + df(t))) + 1
//! ```
//!
//! Each document row is then L2-normalized, so the dot product of two rows is their
//! cosine similarity.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    services::text::tokenize,
};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Row-compressed sparse matrix of `f64` weights
///
/// Column indices within a row are strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

/// Borrowed view of one sparse row
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values: &'a [f64],
}

impl SparseRow<'_> {
    pub fn dot(&self, other: &SparseRow<'_>) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut sum = 0.0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

impl SparseMatrix {
    /// Builds a matrix from per-row `(column, value)` entries sorted by column
    pub fn from_rows(n_cols: usize, rows: Vec<Vec<(usize, f64)>>) -> Self {
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for row in &rows {
            for &(col, value) in row {
                indices.push(col);
                data.push(value);
            }
            indptr.push(indices.len());
        }

        Self {
            n_rows: rows.len(),
            n_cols,
            indptr,
            indices,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values: &self.data[start..end],
        }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let row = self.row(i);
        row.indices
            .binary_search(&j)
            .map(|pos| row.values[pos])
            .unwrap_or(0.0)
    }
}

/// Fitted vocabulary, IDF weights and the resulting document-term matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorSpaceModel {
    /// Term to column index; columns follow the lexical order of terms
    pub vocabulary: BTreeMap<String, usize>,
    /// IDF weight per column
    pub idf: Vec<f64>,
    /// One L2-normalized row per corpus document
    pub matrix: SparseMatrix,
}

impl VectorSpaceModel {
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn n_documents(&self) -> usize {
        self.matrix.n_rows()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }
}

/// TF-IDF vectorizer with a capped vocabulary
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Learns the vocabulary and IDF weights
    ///
    /// Terms are ranked by corpus-wide count (ties by lexical order) and the top
    /// `max_features` are kept. Kept terms get columns in lexical order.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<()> {
        if documents.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let n_docs = documents.len();
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let mut doc_terms: HashSet<&str> = HashSet::new();
            for token in &tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
                doc_terms.insert(token.as_str());
            }
            for term in doc_terms {
                *doc_freq.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort();

        self.idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(col, term)| (term, col))
            .collect();

        tracing::debug!(
            documents = n_docs,
            vocabulary = self.vocabulary.len(),
            "TF-IDF vocabulary fitted"
        );

        Ok(())
    }

    /// Weights documents against the fitted vocabulary
    ///
    /// Documents with no in-vocabulary terms produce an all-zero row.
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> SparseMatrix {
        let rows = documents
            .iter()
            .map(|doc| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in tokenize(doc.as_ref()) {
                    if let Some(&col) = self.vocabulary.get(&token) {
                        *counts.entry(col).or_insert(0.0) += 1.0;
                    }
                }

                let mut row: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(col, tf)| (col, tf * self.idf[col]))
                    .collect();

                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in row.iter_mut() {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        SparseMatrix::from_rows(self.vocabulary.len(), rows)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> AppResult<SparseMatrix> {
        self.fit(documents)?;
        Ok(self.transform(documents))
    }

    /// Bundles the fitted state with a matrix it produced
    pub fn into_model(self, matrix: SparseMatrix) -> VectorSpaceModel {
        VectorSpaceModel {
            vocabulary: self.vocabulary,
            idf: self.idf,
            matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_vocabulary_is_lexically_indexed() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit(&["zebra apple", "mango apple"]).unwrap();

        let vocab: Vec<(&str, usize)> = vectorizer
            .vocabulary()
            .iter()
            .map(|(t, c)| (t.as_str(), *c))
            .collect();
        assert_eq!(vocab, vec![("apple", 0), ("mango", 1), ("zebra", 2)]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_terms() {
        let mut vectorizer = TfidfVectorizer::new(2);
        vectorizer
            .fit(&["car car chase", "car police", "chase wedding"])
            .unwrap();

        // car=3, chase=2, police=1, wedding=1
        let terms: Vec<&str> = vectorizer.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["car", "chase"]);
    }

    #[test]
    fn test_max_features_ties_broken_lexically() {
        let mut vectorizer = TfidfVectorizer::new(2);
        vectorizer.fit(&["delta alpha charlie bravo"]).unwrap();

        let terms: Vec<&str> = vectorizer.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["alpha", "bravo"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let mut vectorizer = TfidfVectorizer::default();
        vectorizer.fit(&["common rare", "common"]).unwrap();

        // N = 2; df(common) = 2, df(rare) = 1
        let common = vectorizer.vocabulary()["common"];
        let rare = vectorizer.vocabulary()["rare"];
        assert!((vectorizer.idf[common] - 1.0).abs() < EPS);
        assert!((vectorizer.idf[rare] - ((3.0f64 / 2.0).ln() + 1.0)).abs() < EPS);
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let mut vectorizer = TfidfVectorizer::default();
        let matrix = vectorizer
            .fit_transform(&["action car chase driver flees", "romance wedding love", "car car"])
            .unwrap();

        for i in 0..matrix.n_rows() {
            assert!((matrix.row(i).norm() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_term_weights_match_formula() {
        let mut vectorizer = TfidfVectorizer::default();
        let matrix = vectorizer.fit_transform(&["common rare rare", "common"]).unwrap();

        let common = vectorizer.vocabulary()["common"];
        let rare = vectorizer.vocabulary()["rare"];
        let w_common = 1.0;
        let w_rare = 2.0 * ((3.0f64 / 2.0).ln() + 1.0);
        let norm = (w_common * w_common + w_rare * w_rare).sqrt();

        assert!((matrix.get(0, common) - w_common / norm).abs() < EPS);
        assert!((matrix.get(0, rare) - w_rare / norm).abs() < EPS);
        assert!((matrix.get(1, common) - 1.0).abs() < EPS);
        assert_eq!(matrix.get(1, rare), 0.0);
    }

    #[test]
    fn test_empty_document_yields_zero_row() {
        let mut vectorizer = TfidfVectorizer::default();
        let matrix = vectorizer.fit_transform(&["space opera", ""]).unwrap();

        assert_eq!(matrix.n_rows(), 2);
        assert_eq!(matrix.row(1).indices.len(), 0);
        assert_eq!(matrix.row(1).norm(), 0.0);
    }

    #[test]
    fn test_fit_rejects_empty_corpus() {
        let mut vectorizer = TfidfVectorizer::default();
        let docs: Vec<&str> = vec![];
        assert!(matches!(vectorizer.fit(&docs), Err(AppError::EmptyCorpus)));
    }

    #[test]
    fn test_sparse_dot_product() {
        let matrix = SparseMatrix::from_rows(
            4,
            vec![vec![(0, 1.0), (2, 2.0)], vec![(1, 5.0), (2, 3.0), (3, 1.0)]],
        );
        assert_eq!(matrix.nnz(), 5);
        assert_eq!(matrix.row(0).dot(&matrix.row(1)), 6.0);
        assert_eq!(matrix.row(1).dot(&matrix.row(0)), 6.0);
    }

    #[test]
    fn test_into_model() {
        let mut vectorizer = TfidfVectorizer::default();
        let matrix = vectorizer.fit_transform(&["car chase", "wedding"]).unwrap();
        let model = vectorizer.into_model(matrix);

        assert_eq!(model.vocabulary_size(), 3);
        assert_eq!(model.n_documents(), 2);
        assert_eq!(model.term_index("chase"), Some(1));
        assert_eq!(model.term_index("the"), None);
    }
}
