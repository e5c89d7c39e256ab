use serde::{Deserialize, Serialize};

use crate::services::text::normalize_text;

/// A single movie row of the corpus
///
/// Only records with all four source fields present are ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub genres: String,
    pub keywords: String,
    pub overview: String,
    /// Cleaned, stop-word-free form of [`MovieRecord::combined_text`]
    pub normalized_text: String,
}

impl MovieRecord {
    /// Creates a record and derives its normalized text
    pub fn new(title: String, genres: String, keywords: String, overview: String) -> Self {
        let mut record = Self {
            title,
            genres,
            keywords,
            overview,
            normalized_text: String::new(),
        };
        record.normalized_text = normalize_text(&record.combined_text());
        record
    }

    /// Genres, keywords and overview joined with single spaces
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.genres, self.keywords, self.overview)
    }
}

/// Ordered movie records; a record's position is its row in every index matrix
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Corpus {
    records: Vec<MovieRecord>,
}

impl Corpus {
    pub fn new(records: Vec<MovieRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&MovieRecord> {
        self.records.get(row)
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    /// Row of the first record whose title matches exactly (case-sensitive)
    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.records.iter().position(|r| r.title == title)
    }

    /// Normalized texts in row order, as fed to the vectorizer
    pub fn documents(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.normalized_text.as_str())
            .collect()
    }

    /// Distinct titles sorted lexically
    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self.records.iter().map(|r| r.title.clone()).collect();
        titles.sort();
        titles.dedup();
        titles
    }
}
