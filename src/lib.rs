//! Note map service: TF-IDF embedding, t-SNE projection and DBSCAN clustering
//! of note batches, with per-cluster and per-note term summaries.

pub mod config;
pub mod connection;
pub mod dbscan;
pub mod error;
pub mod note;
pub mod processor;
pub mod server;
pub mod summary;
pub mod text;
pub mod tfidf;
pub mod tsne;
pub mod vector_ops;

pub use error::{Error, Result};

/// Ten short notes about machine learning and web development.
pub const SAMPLE_NOTES_JSON: &str = include_str!("../data/sample_notes.json");

pub fn sample_notes() -> serde_json::Result<Vec<note::Note>> {
    serde_json::from_str(SAMPLE_NOTES_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_sample_parses() {
        let notes = sample_notes().unwrap();
        assert_eq!(notes.len(), 10);
        assert_eq!(notes[0].path, "note1.md");
        assert_eq!(notes[9].title, "Natural Language Processing");
    }
}
