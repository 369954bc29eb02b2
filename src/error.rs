use thiserror::Error;

/// Errors returned by the note-processing pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Not enough notes for a meaningful projection.
    #[error("Need at least {required} notes to perform meaningful t-SNE, got {found}")]
    TooFewNotes { required: usize, found: usize },

    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Every document reduced to nothing after tokenization.
    #[error("empty vocabulary; perhaps the documents only contain stop words")]
    EmptyVocabulary,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },

    /// Row-aligned inputs disagree on length or width.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Background task failed before producing a result.
    #[error("worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, Error>;
