//! Error types for tql operations

use thiserror::Error;

/// Result type used throughout tql-core
pub type Result<T> = std::result::Result<T, TqlError>;

#[derive(Error, Debug)]
pub enum TqlError {
    /// The conversation wrapper disagrees with its own contents
    #[error("Malformed conversation: {message}")]
    MalformedConversation { message: String },

    #[error("DIFF operations can only be performed on matching datasets")]
    AnchorMismatch,

    #[error("{}", describe_missing_rows(.facet, .indices))]
    RowNotFound { facet: String, indices: Vec<usize> },

    #[error("Facet @{facet} declares {declared} rows but contains {actual}")]
    RowCountMismatch {
        facet: String,
        declared: usize,
        actual: usize,
    },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Document at index {slot} not found")]
    DocumentNotFound { slot: usize },

    #[error("Unknown facet: {name}")]
    UnknownFacet { name: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TqlError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn malformed_conversation(message: impl Into<String>) -> Self {
        Self::MalformedConversation {
            message: message.into(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

fn describe_missing_rows(facet: &str, indices: &[usize]) -> String {
    match indices {
        [index] => format!("Row with index {index} not found in @{facet} facet"),
        _ => {
            let list: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
            format!(
                "No rows found with indices {} in @{facet} facet",
                list.join(", ")
            )
        }
    }
}
