//! Error types shared by every stage of the export pipeline.

use thiserror::Error;

/// The error type for loading vocabulary, selecting entries and writing sheets.
#[derive(Debug, Error)]
pub enum DictationError {
    /// Bad caller input: list numbers, sample counts, unsupported source files.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vocabulary row whose identifier is not of the `List<N>-<M>` shape.
    #[error("malformed row {row}: {reason} (identifier: {identifier:?})")]
    MalformedRow {
        row: usize,
        identifier: String,
        reason: String,
    },

    /// A sample larger than the pool of filtered entries.
    #[error("requested {requested} words but only {available} available from selected lists")]
    InsufficientData { requested: usize, available: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl DictationError {
    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            DictationError::InvalidArgument(_) => 2,
            DictationError::MalformedRow { .. } | DictationError::InsufficientData { .. } => 3,
            DictationError::Io(_)
            | DictationError::Workbook(_)
            | DictationError::Pdf(_)
            | DictationError::Config(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DictationError>;
