use serde::{Deserialize, Serialize};

use crate::services::vectorizer::SparseMatrix;

/// Dense, symmetric matrix of pairwise cosine similarities
///
/// Row `i` and column `i` both refer to corpus row `i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Computes cosine similarity for every document pair
    ///
    /// Rows are expected to be L2-normalized, so similarity is the plain dot product.
    /// Only the upper triangle is computed; the lower one is mirrored from it.
    pub fn from_tfidf(matrix: &SparseMatrix) -> Self {
        let size = matrix.n_rows();
        let mut values = vec![0.0; size * size];

        for i in 0..size {
            let row_i = matrix.row(i);
            for j in i..size {
                let score = row_i.dot(&matrix.row(j));
                values[i * size + j] = score;
                values[j * size + i] = score;
            }
        }

        Self { size, values }
    }

    /// Side length (number of corpus documents)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Similarity of document `i` to every document, in corpus order
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.values.len() == self.size * self.size
    }
}
