use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Failed to fetch metadata for {id}: {message}")]
    Metadata { id: String, message: String },

    #[error("Transfer of {id} failed: {message}")]
    Stream { id: String, message: String },

    #[error("Failed to write manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to append to failure log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failure modes of turning a container file into links.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Container file not found: {0}")]
    ContainerMissing(PathBuf),

    #[error("Malformed response from decryption service: {0}")]
    Malformed(String),

    #[error("Decryption service rejected {field}: {}", .messages.join("; "))]
    Validation {
        field: String,
        messages: Vec<String>,
    },

    #[error("Decryption request failed: {0}")]
    Transport(String),
}
