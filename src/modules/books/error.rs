use thiserror::Error;

/// Failures of catalog operations. None of them leave a partially applied change behind,
/// except `Storage`, where the in-memory change stands but could not be saved.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("no book with ISBN {isbn}")]
    NotFound { isbn: String },

    #[error("no copies of \"{title}\" are available")]
    Unavailable { isbn: String, title: String },

    #[error("no copies of \"{title}\" were recorded as borrowed")]
    NothingToReturn { isbn: String, title: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LibraryError {
    /// Title of the book involved, or an empty string when the ISBN is unknown
    pub fn title(&self) -> &str {
        match self {
            LibraryError::Unavailable { title, .. } | LibraryError::NothingToReturn { title, .. } => {
                title
            }
            _ => "",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode catalog: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stored catalog is unreadable: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("stored catalog has unsupported schema version {0}")]
    UnsupportedVersion(u32),
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
