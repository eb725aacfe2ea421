use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtomError {
    // Quota and remote generation
    #[error("Free tier quota of {limit} renders per day reached")]
    QuotaExceeded { limit: u32 },

    #[error("{operation} failed: {message}")]
    RemoteGeneration { operation: String, message: String },

    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    // IO-related errors
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access directory: {path}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error")]
    Io(#[from] std::io::Error),

    // Data processing errors
    #[error("Failed to parse JSON: {context}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode JSON")]
    Json(#[from] serde_json::Error),

    #[error("Image processing failed")]
    Image(#[from] image::ImageError),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // Environment-related errors
    #[error("No API key configured (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,

    #[error("Data directory could not be determined")]
    DataDirNotFound,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Thread pool initialization failed")]
    ThreadPoolInit(#[from] rayon::ThreadPoolBuildError),
}

impl AtomError {
    pub(crate) fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        AtomError::RemoteGeneration {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        AtomError::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AtomError>;
