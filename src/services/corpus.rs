use std::{io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{Corpus, MovieRecord},
};

/// Loads and normalizes the movie corpus from a CSV file
///
/// Rows missing any of the required fields are dropped; surviving rows are numbered
/// contiguously from 0 in file order.
#[tracing::instrument]
pub fn load_corpus(path: &Path) -> AppResult<Corpus> {
    let file = std::fs::File::open(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to open corpus");
        e
    })?;
    load_corpus_from_reader(file)
}

/// Loads the corpus from any CSV byte stream with a header row
pub fn load_corpus_from_reader<R: Read>(reader: R) -> AppResult<Corpus> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| AppError::MissingColumn(name.to_string()))
    };
    let genres_idx = column("genres")?;
    let keywords_idx = column("keywords")?;
    let overview_idx = column("overview")?;
    let title_idx = column("title")?;

    let mut records = Vec::new();
    let mut total_rows = 0usize;

    for row in reader.records() {
        let row = row?;
        total_rows += 1;

        let field = |idx: usize| {
            row.get(idx)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };

        if let (Some(genres), Some(keywords), Some(overview), Some(title)) = (
            field(genres_idx),
            field(keywords_idx),
            field(overview_idx),
            field(title_idx),
        ) {
            records.push(MovieRecord::new(title, genres, keywords, overview));
        }
    }

    tracing::info!(
        total_rows,
        kept = records.len(),
        dropped = total_rows - records.len(),
        "Corpus loaded"
    );

    Ok(Corpus::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_required_columns_and_normalizes() {
        let csv = "\
budget,title,genres,keywords,overview,vote_average
100,Alpha,Action,car chase,A driver flees,7.1
";
        let corpus = load_corpus_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 1);

        let alpha = corpus.get(0).unwrap();
        assert_eq!(alpha.title, "Alpha");
        assert_eq!(alpha.genres, "Action");
        assert_eq!(alpha.keywords, "car chase");
        assert_eq!(alpha.overview, "A driver flees");
        assert_eq!(alpha.normalized_text, "action car chase driver flees");
    }

    #[test]
    fn test_drops_incomplete_rows_and_reindexes() {
        let csv = "\
title,genres,keywords,overview
Alpha,Action,car chase,A driver flees
Broken,Drama,,Missing keywords
,Comedy,jokes,No title
Gamma,Romance,wedding,Two people fall in love
";
        let corpus = load_corpus_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).unwrap().title, "Alpha");
        assert_eq!(corpus.get(1).unwrap().title, "Gamma");
        assert_eq!(corpus.position_of("Gamma"), Some(1));
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let csv = "\
title,genres,keywords,overview
\"Crouching Tiger, Hidden Dragon\",Action Drama,\"sword, martial arts\",\"A warrior, a thief\"
";
        let corpus = load_corpus_from_reader(csv.as_bytes()).unwrap();
        let movie = corpus.get(0).unwrap();
        assert_eq!(movie.title, "Crouching Tiger, Hidden Dragon");
        assert_eq!(movie.normalized_text, "action drama sword martial arts warrior thief");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "title,genres,overview\nAlpha,Action,A driver flees\n";
        let result = load_corpus_from_reader(csv.as_bytes());
        assert!(matches!(result, Err(AppError::MissingColumn(col)) if col == "keywords"));
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let csv = "title,genres,keywords,overview\nAlpha,Action\n";
        let result = load_corpus_from_reader(csv.as_bytes());
        assert!(matches!(result, Err(AppError::Csv(_))));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_corpus(Path::new("/nonexistent/movies.csv"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
